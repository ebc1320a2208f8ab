mod color;
mod palette;
mod volume;

pub use color::ChannelOrder;
pub use color::ColorImage;

pub use palette::Color;
pub use palette::Palette;

pub use volume::ProbabilityBuffer;
pub use volume::ProbabilityVolume;
