mod bit_rate;
mod packet_sizes;

pub use self::{bit_rate::BitRate, packet_sizes::PacketSizes};
