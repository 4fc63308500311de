pub mod glob;
pub mod html;
pub mod mime;
pub mod plural;
