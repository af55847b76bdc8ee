//! Popup HTML for wall segments and points of interest.
//!
//! A popup is a fixed, ordered list of blocks. Each block is a pure function of
//! the feature and yields `None` when its source attribute is absent, so no
//! empty containers are ever emitted.

use formats::Feature;

use crate::keys;

pub type Block = fn(&Feature) -> Option<String>;

pub const LINE_ENTITY: &str = "Muretto";
pub const STATE_NOT_AVAILABLE: &str = "n.d.";
pub const POINT_FALLBACK_TITLE: &str = "POI";

/// Title, state, note, photo.
pub const LINE_BLOCKS: [Block; 4] = [line_title, line_state, line_note, line_photo];

/// Title, content, image, link, folder link.
pub const POINT_BLOCKS: [Block; 5] = [
    point_title,
    point_content,
    point_image,
    point_link,
    point_folder_link,
];

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn assemble(blocks: &[Block], feature: &Feature) -> Vec<String> {
    blocks.iter().filter_map(|block| block(feature)).collect()
}

pub fn line_blocks(feature: &Feature) -> Vec<String> {
    assemble(&LINE_BLOCKS, feature)
}

pub fn point_blocks(feature: &Feature) -> Vec<String> {
    assemble(&POINT_BLOCKS, feature)
}

pub fn line_popup(feature: &Feature) -> String {
    line_blocks(feature).join("\n")
}

pub fn point_popup(feature: &Feature) -> String {
    point_blocks(feature).join("\n")
}

fn heading(text: &str) -> String {
    format!(r#"<h3 style="margin:0 0 6px 0;">{}</h3>"#, escape_html(text))
}

fn image(url: &str) -> String {
    format!(
        r#"<p style="margin:8px 0 0 0;"><img src="{}" alt="" style="width:100%;border-radius:10px"/></p>"#,
        escape_html(url)
    )
}

fn external_link(url: &str, label: &str) -> String {
    format!(
        r#"<p style="margin:8px 0 0 0;"><a href="{}" target="_blank" rel="noopener">{label}</a></p>"#,
        escape_html(url)
    )
}

fn paragraph(text: &str) -> String {
    format!(r#"<p style="margin:6px 0 0 0;">{}</p>"#, escape_html(text))
}

fn line_id(feature: &Feature) -> String {
    feature
        .text(keys::ID)
        .or_else(|| feature.id.clone())
        .unwrap_or_default()
}

pub fn line_title(feature: &Feature) -> Option<String> {
    let title = feature
        .text(keys::TITLE)
        .unwrap_or_else(|| format!("{LINE_ENTITY} {}", line_id(feature)).trim().to_string());
    Some(heading(&title))
}

/// Always rendered; shows the raw attribute, not the classified state.
pub fn line_state(feature: &Feature) -> Option<String> {
    let state = feature
        .text(keys::STATE)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| STATE_NOT_AVAILABLE.to_string());
    Some(format!(
        r#"<p style="margin:0;"><b>Stato:</b> {}</p>"#,
        escape_html(&state)
    ))
}

pub fn line_note(feature: &Feature) -> Option<String> {
    feature.text(keys::NOTE).map(|note| paragraph(&note))
}

pub fn line_photo(feature: &Feature) -> Option<String> {
    feature.text(keys::PHOTO).map(|url| image(&url))
}

pub fn point_title(feature: &Feature) -> Option<String> {
    let title = feature
        .text(keys::TITLE)
        .unwrap_or_else(|| POINT_FALLBACK_TITLE.to_string());
    Some(heading(&title))
}

/// Raw HTML wins over the plain description. The HTML attribute is curated
/// dataset content and is inserted verbatim.
pub fn point_content(feature: &Feature) -> Option<String> {
    feature
        .text(keys::HTML)
        .or_else(|| feature.text(keys::DESCRIPTION).map(|d| paragraph(&d)))
}

pub fn point_image(feature: &Feature) -> Option<String> {
    feature.text(keys::IMAGE).map(|url| image(&url))
}

pub fn point_link(feature: &Feature) -> Option<String> {
    feature
        .text(keys::LINK)
        .map(|url| external_link(&url, "Apri link"))
}

pub fn point_folder_link(feature: &Feature) -> Option<String> {
    feature
        .text(keys::FOLDER)
        .map(|url| external_link(&url, "Apri cartella Drive"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::GeoPoint;
    use formats::Geometry;
    use pretty_assertions::assert_eq;

    fn line() -> Feature {
        Feature::new(Geometry::LineString(vec![
            GeoPoint::new(41.0, 12.0),
            GeoPoint::new(41.1, 12.1),
        ]))
    }

    fn point() -> Feature {
        Feature::new(Geometry::Point(GeoPoint::new(41.0, 12.0)))
    }

    #[test]
    fn full_line_popup_keeps_block_order() {
        let f = line()
            .with_property(keys::TITLE, "Muro nord")
            .with_property(keys::STATE, "buono")
            .with_property(keys::NOTE, "Rifatto nel 2019")
            .with_property(keys::PHOTO, "https://example.org/a.jpg");
        let blocks = line_blocks(&f);
        assert_eq!(blocks.len(), 4);
        assert!(blocks[0].starts_with("<h3") && blocks[0].contains("Muro nord"));
        assert!(blocks[1].contains("<b>Stato:</b> buono"));
        assert!(blocks[2].contains("Rifatto nel 2019"));
        assert!(blocks[3].contains(r#"<img src="https://example.org/a.jpg""#));
    }

    #[test]
    fn title_only_line_has_title_and_fallback_state() {
        let f = line().with_property(keys::TITLE, "Muro sud");
        assert_eq!(
            line_blocks(&f),
            vec![
                r#"<h3 style="margin:0 0 6px 0;">Muro sud</h3>"#.to_string(),
                r#"<p style="margin:0;"><b>Stato:</b> n.d.</p>"#.to_string(),
            ]
        );
    }

    #[test]
    fn line_title_falls_back_to_entity_and_id() {
        let with_id = line().with_property(keys::ID, 42);
        assert!(line_title(&with_id).unwrap().contains(">Muretto 42<"));

        let mut from_feature_id = line();
        from_feature_id.id = Some("w-7".to_string());
        assert!(line_title(&from_feature_id).unwrap().contains(">Muretto w-7<"));

        assert!(line_title(&line()).unwrap().contains(">Muretto<"));
    }

    #[test]
    fn state_line_shows_raw_value() {
        let f = line().with_property(keys::STATE, "PESSIMO ");
        assert!(line_state(&f).unwrap().contains("</b> PESSIMO </p>"));
    }

    #[test]
    fn text_is_escaped() {
        let f = line()
            .with_property(keys::TITLE, "<script>x</script>")
            .with_property(keys::PHOTO, r#"a.jpg" onerror="alert(1)"#);
        let html = line_popup(&f);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a.jpg&quot; onerror=&quot;alert(1)"));
    }

    #[test]
    fn point_popup_full_order() {
        let f = point()
            .with_property(keys::TITLE, "Fontana")
            .with_property(keys::DESCRIPTION, "Antica fonte")
            .with_property(keys::IMAGE, "img.png")
            .with_property(keys::LINK, "https://a.example")
            .with_property(keys::FOLDER, "https://drive.example");
        let blocks = point_blocks(&f);
        assert_eq!(blocks.len(), 5);
        assert!(blocks[0].contains("Fontana"));
        assert!(blocks[1].contains("Antica fonte"));
        assert!(blocks[2].contains("img.png"));
        assert!(blocks[3].contains("Apri link"));
        assert!(blocks[4].contains("Apri cartella Drive"));
    }

    #[test]
    fn point_html_beats_description_and_is_verbatim() {
        let f = point()
            .with_property(keys::HTML, "<ul><li>uno</li></ul>")
            .with_property(keys::DESCRIPTION, "ignored");
        assert_eq!(point_content(&f).as_deref(), Some("<ul><li>uno</li></ul>"));
    }

    #[test]
    fn bare_point_has_only_generic_title() {
        assert_eq!(
            point_popup(&point()),
            r#"<h3 style="margin:0 0 6px 0;">POI</h3>"#
        );
    }
}
