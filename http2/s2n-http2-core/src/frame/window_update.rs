// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{decoder_parameterized_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.9
//# The WINDOW_UPDATE frame (type=0x08) is used to implement flow
//# control; see Section 5.2 for an overview.

macro_rules! window_update_tag {
    () => {
        0x08u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.9
//# WINDOW_UPDATE Frame {
//#   Length (24) = 0x04,
//#   Type (8) = 0x08,
//#
//#   Unused Flags (8),
//#
//#   Reserved (1),
//#   Stream Identifier (31),
//#
//#   Reserved (1),
//#   Window Size Increment (31),
//# }

/// The exact payload length of a WINDOW_UPDATE frame
pub const WINDOW_UPDATE_PAYLOAD_LEN: usize = 4;

/// Grants additional flow-control credit for a stream or, when sent on
/// stream 0, for the entire connection.
///
/// A zero increment is not rejected here; whether it is a stream or
/// connection error depends on the stream the frame arrives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowUpdate {
    /// The stream gaining credit, or stream 0 for the connection
    pub stream_id: StreamId,

    /// The number of octets the sender may transmit in addition to the
    /// existing window
    pub window_size_increment: u32,
}

impl WindowUpdate {
    pub const fn tag(&self) -> Tag {
        window_update_tag!()
    }
}

decoder_parameterized_value!(
    impl<'a> WindowUpdate {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            let (word, buffer) = buffer.decode::<u32>()?;

            let frame = WindowUpdate {
                stream_id: header.stream_id,
                window_size_increment: word & StreamId::MAX,
            };

            Ok((frame, buffer))
        }
    }
);

impl EncoderValue for WindowUpdate {
    #[inline]
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let header = FrameHeader::new(
            WINDOW_UPDATE_PAYLOAD_LEN as u32,
            self.tag(),
            0,
            self.stream_id,
        );
        buffer.encode(&header);
        buffer.encode(&self.window_size_increment);
    }
}
