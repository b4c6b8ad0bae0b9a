mod exif;
mod list;
mod upload;

pub use exif::{run_exif, ExifReport};
pub use list::run_list;
pub use upload::run_upload;
