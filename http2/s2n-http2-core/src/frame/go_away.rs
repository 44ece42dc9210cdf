// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::ErrorCode,
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{decoder_invariant, decoder_parameterized_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.8
//# The GOAWAY frame (type=0x07) is used to initiate shutdown of a
//# connection or to signal serious error conditions.

macro_rules! go_away_tag {
    () => {
        0x07u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.8
//# GOAWAY Frame {
//#   Length (24),
//#   Type (8) = 0x07,
//#
//#   Unused Flags (8),
//#
//#   Reserved (1),
//#   Stream Identifier (31) = 0,
//#
//#   Reserved (1),
//#   Last-Stream-ID (31),
//#   Error Code (32),
//#   Additional Debug Data (..),
//# }

/// The minimum payload length of a GOAWAY frame
pub const GO_AWAY_MIN_PAYLOAD_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoAway<'a> {
    /// The highest peer-initiated stream the sender might have processed
    pub last_stream_id: StreamId,

    /// The reason for closing the connection
    pub error_code: ErrorCode,

    /// Opaque diagnostic data, visible to the listener only
    pub debug_data: &'a [u8],
}

impl<'a> GoAway<'a> {
    pub const fn tag(&self) -> Tag {
        go_away_tag!()
    }
}

decoder_parameterized_value!(
    impl<'a> GoAway<'a> {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.8
            //# An endpoint MUST treat a GOAWAY frame with a stream identifier
            //# other than 0x0 as a connection error (Section 5.4.1) of type
            //# PROTOCOL_ERROR.
            decoder_invariant!(
                header.stream_id.is_connection_control(),
                "GOAWAY frame on a non-zero stream"
            );

            let (last_stream_id, buffer) = buffer.decode::<StreamId>()?;
            let (error_code, buffer) = buffer.decode::<ErrorCode>()?;

            let len = buffer.len();
            let (debug_data, buffer) = buffer.decode_slice(len)?;

            #[allow(clippy::all)]
            let debug_data = &debug_data.into_less_safe_slice()[..];

            let frame = GoAway {
                last_stream_id,
                error_code,
                debug_data,
            };

            Ok((frame, buffer))
        }
    }
);

impl<'a> EncoderValue for GoAway<'a> {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let length = GO_AWAY_MIN_PAYLOAD_LEN + self.debug_data.len();
        let header = FrameHeader::new(length as u32, self.tag(), 0, StreamId::CONNECTION);
        buffer.encode(&header);
        buffer.encode(&self.last_stream_id);
        buffer.encode(&self.error_code);
        buffer.write_slice(self.debug_data);
    }
}
