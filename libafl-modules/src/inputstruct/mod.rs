pub mod grammar;
pub mod ndn_packet;
pub mod ndn_tlv;
pub mod packet_ring;
pub mod tlv;

pub use grammar::{ContainerKind, Grammar};
pub use packet_ring::PacketRing;
pub use tlv::{Element, Tag};
