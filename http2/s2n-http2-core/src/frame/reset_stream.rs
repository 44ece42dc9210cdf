// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::ErrorCode,
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{decoder_invariant, decoder_parameterized_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.4
//# The RST_STREAM frame (type=0x03) allows for immediate termination of
//# a stream.  RST_STREAM is sent to request cancellation of a stream or
//# to indicate that an error condition has occurred.

macro_rules! reset_stream_tag {
    () => {
        0x03u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.4
//# RST_STREAM Frame {
//#   Length (24) = 0x04,
//#   Type (8) = 0x03,
//#
//#   Unused Flags (8),
//#
//#   Reserved (1),
//#   Stream Identifier (31),
//#
//#   Error Code (32),
//# }

/// The exact payload length of a RST_STREAM frame
pub const RESET_STREAM_PAYLOAD_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetStream {
    /// The stream being terminated
    pub stream_id: StreamId,

    /// The reason the sender is terminating the stream
    pub error_code: ErrorCode,
}

impl ResetStream {
    pub const fn tag(&self) -> Tag {
        reset_stream_tag!()
    }
}

decoder_parameterized_value!(
    impl<'a> ResetStream {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.4
            //# If a RST_STREAM frame is received with a stream identifier of
            //# 0x00, the recipient MUST treat this as a connection error
            //# (Section 5.4.1) of type PROTOCOL_ERROR.
            decoder_invariant!(
                !header.stream_id.is_connection_control(),
                "RST_STREAM frame on the connection control stream"
            );

            let (error_code, buffer) = buffer.decode::<ErrorCode>()?;

            let frame = ResetStream {
                stream_id: header.stream_id,
                error_code,
            };

            Ok((frame, buffer))
        }
    }
);

impl EncoderValue for ResetStream {
    #[inline]
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let header = FrameHeader::new(
            RESET_STREAM_PAYLOAD_LEN as u32,
            self.tag(),
            0,
            self.stream_id,
        );
        buffer.encode(&header);
        buffer.encode(&self.error_code);
    }
}
