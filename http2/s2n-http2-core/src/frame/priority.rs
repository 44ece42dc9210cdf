// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{
    decoder_invariant, decoder_parameterized_value, decoder_value, Encoder, EncoderValue,
};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.3
//# The PRIORITY frame (type=0x02) is deprecated; see Section 5.3.2.  A
//# PRIORITY frame can be sent in any stream state, including idle or
//# closed streams.

macro_rules! priority_tag {
    () => {
        0x02u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.3
//# PRIORITY Frame {
//#   Length (24) = 0x05,
//#   Type (8) = 0x02,
//#
//#   Unused Flags (8),
//#
//#   Reserved (1),
//#   Stream Identifier (31),
//#
//#   Exclusive (1),
//#   Stream Dependency (31),
//#   Weight (8),
//# }

/// The weight assigned to a stream that carries no explicit priority
pub const DEFAULT_PRIORITY_WEIGHT: u16 = 16;

/// The exact payload length of a PRIORITY frame
pub const PRIORITY_PAYLOAD_LEN: usize = 5;

const EXCLUSIVE_BIT: u32 = 1 << 31;

/// The dependency/weight/exclusive triple recorded on a stream.
///
/// The weight is kept in its semantic range of 1 to 256; the wire carries
/// it as one octet biased by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Priority {
    /// The stream this stream depends on, or stream 0 for the root
    pub dependency: StreamId,

    /// The relative weight of the stream, between 1 and 256
    pub weight: u16,

    /// If true, the stream becomes the sole dependency of its parent
    pub exclusive: bool,
}

impl Default for Priority {
    #[inline]
    fn default() -> Self {
        Self {
            dependency: StreamId::CONNECTION,
            weight: DEFAULT_PRIORITY_WEIGHT,
            exclusive: false,
        }
    }
}

decoder_value!(
    impl<'a> Priority {
        fn decode(buffer: Buffer) -> Result<Self> {
            let (word, buffer) = buffer.decode::<u32>()?;
            let (weight, buffer) = buffer.decode::<u8>()?;

            let priority = Priority {
                dependency: StreamId::new(word & StreamId::MAX).unwrap_or(StreamId::CONNECTION),
                //= https://www.rfc-editor.org/rfc/rfc9113#section-6.3
                //# Weight:  An unsigned 8-bit integer representing a priority
                //#    weight for the stream (see Section 5.3).  Add one to the
                //#    value to obtain a weight between 1 and 256.
                weight: u16::from(weight) + 1,
                exclusive: word & EXCLUSIVE_BIT == EXCLUSIVE_BIT,
            };

            Ok((priority, buffer))
        }
    }
);

impl EncoderValue for Priority {
    #[inline]
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let mut word = self.dependency.as_u32();
        if self.exclusive {
            word |= EXCLUSIVE_BIT;
        }
        buffer.encode(&word);
        buffer.encode(&(self.weight.saturating_sub(1).min(255) as u8));
    }
}

/// A standalone PRIORITY frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriorityFrame {
    pub stream_id: StreamId,
    pub priority: Priority,
}

impl PriorityFrame {
    pub const fn tag(&self) -> Tag {
        priority_tag!()
    }
}

decoder_parameterized_value!(
    impl<'a> PriorityFrame {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.3
            //# If a PRIORITY frame is received with a stream identifier of
            //# 0x00, the recipient MUST respond with a connection error
            //# (Section 5.4.1) of type PROTOCOL_ERROR.
            decoder_invariant!(
                !header.stream_id.is_connection_control(),
                "PRIORITY frame on the connection control stream"
            );

            let (priority, buffer) = buffer.decode::<Priority>()?;

            let frame = PriorityFrame {
                stream_id: header.stream_id,
                priority,
            };

            Ok((frame, buffer))
        }
    }
);

impl EncoderValue for PriorityFrame {
    #[inline]
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let header = FrameHeader::new(
            PRIORITY_PAYLOAD_LEN as u32,
            self.tag(),
            0,
            self.stream_id,
        );
        buffer.encode(&header);
        buffer.encode(&self.priority);
    }
}
