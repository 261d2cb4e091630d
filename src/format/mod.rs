/// RTP packet parsing and H.264 depacketization
pub mod rtp;

pub use self::rtp::{Depacketizer, RTPPacket, SsrcFilter};
