// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{decoder_invariant, decoder_parameterized_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.6
//# The PUSH_PROMISE frame (type=0x05) is used to notify the peer
//# endpoint in advance of streams the sender intends to initiate.

macro_rules! push_promise_tag {
    () => {
        0x05u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.6
//# PUSH_PROMISE Frame {
//#   Length (24),
//#   Type (8) = 0x05,
//#
//#   Unused Flags (4),
//#   PADDED Flag (1),
//#   END_HEADERS Flag (1),
//#   Unused Flags (2),
//#
//#   Reserved (1),
//#   Stream Identifier (31),
//#
//#   [Pad Length (8)],
//#   Reserved (1),
//#   Promised Stream ID (31),
//#   Field Block Fragment (..),
//#   Padding (..2040),
//# }

/// Indicates that the frame carries the entire field block
pub const END_HEADERS: u8 = 0x04;

/// Indicates that the Pad Length field and padding are present
pub const PADDED: u8 = 0x08;

/// A PUSH_PROMISE frame reserving a server-initiated stream
#[derive(Debug, PartialEq, Eq)]
pub struct PushPromise<'a> {
    /// The stream the promise is associated with
    pub stream_id: StreamId,

    /// The stream the sender reserves for the promised response
    pub promised_stream_id: StreamId,

    /// The encoded field block fragment of the promised request
    pub fragment: &'a [u8],

    /// The total number of padding octets, including the Pad Length octet
    pub padding: usize,

    /// If true, the field block is complete without CONTINUATION frames
    pub end_headers: bool,
}

impl<'a> PushPromise<'a> {
    pub const fn tag(&self) -> Tag {
        push_promise_tag!()
    }
}

decoder_parameterized_value!(
    impl<'a> PushPromise<'a> {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.6
            //# If the Stream Identifier field specifies the value 0x00, a
            //# recipient MUST respond with a connection error (Section 5.4.1)
            //# of type PROTOCOL_ERROR.
            decoder_invariant!(
                !header.stream_id.is_connection_control(),
                "PUSH_PROMISE frame on the connection control stream"
            );

            let (pad_length, buffer) = if header.flag(PADDED) {
                let (pad_length, buffer) = buffer.decode::<u8>()?;
                (Some(pad_length as usize), buffer)
            } else {
                (None, buffer)
            };

            let (promised_stream_id, buffer) = buffer.decode::<StreamId>()?;
            decoder_invariant!(
                !promised_stream_id.is_connection_control(),
                "promised stream identifier must be non-zero"
            );

            let pad_length = pad_length.unwrap_or(0);
            decoder_invariant!(
                pad_length <= buffer.len(),
                "padding exceeds the frame payload"
            );

            let fragment_len = buffer.len() - pad_length;
            let (fragment, buffer) = buffer.decode_slice(fragment_len)?;
            let buffer = buffer.skip(pad_length)?;

            #[allow(clippy::all)]
            let fragment = &fragment.into_less_safe_slice()[..];

            let frame = PushPromise {
                stream_id: header.stream_id,
                promised_stream_id,
                fragment,
                padding: if header.flag(PADDED) { pad_length + 1 } else { 0 },
                end_headers: header.flag(END_HEADERS),
            };

            Ok((frame, buffer))
        }
    }
);

impl<'a> EncoderValue for PushPromise<'a> {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let mut flags = 0;
        if self.end_headers {
            flags |= END_HEADERS;
        }
        if self.padding > 0 {
            flags |= PADDED;
        }

        let length = 4 + self.fragment.len() + self.padding;
        let header = FrameHeader::new(length as u32, self.tag(), flags, self.stream_id);
        buffer.encode(&header);

        if self.padding > 0 {
            buffer.encode(&((self.padding - 1) as u8));
        }
        buffer.encode(&self.promised_stream_id);
        buffer.write_slice(self.fragment);
        if self.padding > 0 {
            buffer.write_repeated(self.padding - 1, 0);
        }
    }
}
