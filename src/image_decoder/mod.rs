pub mod impl_image;
pub mod interface;
