mod koto;
mod meridian;
mod playalife;
mod solis;
mod wolfe;

pub use koto::Koto;
pub use meridian::Meridian;
pub use playalife::PlayaLife;
pub use solis::Solis;
pub use wolfe::Wolfe;
