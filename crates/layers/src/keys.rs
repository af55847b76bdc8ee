//! Attribute names used by the wall and point-of-interest datasets.

pub const STATE: &str = "stato";
pub const WEIGHT: &str = "weight";
pub const TITLE: &str = "titolo";
pub const NOTE: &str = "note";
pub const PHOTO: &str = "foto";
pub const ID: &str = "id";

pub const SIZE: &str = "size";
pub const COLOR: &str = "color";
pub const HTML: &str = "html";
pub const DESCRIPTION: &str = "descrizione";
pub const LINK: &str = "link";
pub const FOLDER: &str = "data";
pub const IMAGE: &str = "immagine";
