// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{
    decoder_invariant, decoder_parameterized_value, DecoderError, Encoder, EncoderValue,
};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.7
//# The PING frame (type=0x06) is a mechanism for measuring a minimal
//# round-trip time from the sender, as well as determining whether an
//# idle connection is still functional.

macro_rules! ping_tag {
    () => {
        0x06u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.7
//# PING Frame {
//#   Length (24) = 0x08,
//#   Type (8) = 0x06,
//#
//#   Unused Flags (7),
//#   ACK Flag (1),
//#
//#   Reserved (1),
//#   Stream Identifier (31) = 0,
//#
//#   Opaque Data (64),
//# }

/// Indicates that this PING frame is a response
pub const ACK: u8 = 0x01;

/// The exact payload length of a PING frame
pub const PING_PAYLOAD_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ping {
    /// If true, the frame is a response to a peer PING
    pub ack: bool,

    /// The opaque data echoed back in the acknowledgement.
    ///
    /// The payload is copied out of the receive buffer so that the
    /// acknowledgement can be written after the buffer is released.
    pub data: [u8; PING_PAYLOAD_LEN],
}

impl Ping {
    /// Creates the acknowledgement for this PING frame
    #[inline]
    pub const fn to_ack(self) -> Self {
        Self {
            ack: true,
            data: self.data,
        }
    }

    pub const fn tag(&self) -> Tag {
        ping_tag!()
    }
}

decoder_parameterized_value!(
    impl<'a> Ping {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.7
            //# If a PING frame is received with a Stream Identifier field value
            //# other than 0x00, the recipient MUST respond with a connection
            //# error (Section 5.4.1) of type PROTOCOL_ERROR.
            decoder_invariant!(
                header.stream_id.is_connection_control(),
                "PING frame on a non-zero stream"
            );

            let (data, buffer) = buffer.decode_slice(PING_PAYLOAD_LEN)?;

            #[allow(clippy::all)]
            let data = &data.into_less_safe_slice()[..];
            let data = data
                .try_into()
                .map_err(|_| DecoderError::InvariantViolation("PING payload length mismatch"))?;

            let frame = Ping {
                ack: header.flag(ACK),
                data,
            };

            Ok((frame, buffer))
        }
    }
);

impl EncoderValue for Ping {
    #[inline]
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let flags = if self.ack { ACK } else { 0 };
        let header = FrameHeader::new(
            PING_PAYLOAD_LEN as u32,
            self.tag(),
            flags,
            StreamId::CONNECTION,
        );
        buffer.encode(&header);
        buffer.write_slice(&self.data);
    }
}
