// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    frame::{priority::Priority, FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{decoder_invariant, decoder_parameterized_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.2
//# The HEADERS frame (type=0x01) is used to open a stream (Section 5.1),
//# and additionally carries a field block fragment.

macro_rules! headers_tag {
    () => {
        0x01u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.2
//# HEADERS Frame {
//#   Length (24),
//#   Type (8) = 0x01,
//#
//#   Unused Flags (2),
//#   PRIORITY Flag (1),
//#   Unused Flag (1),
//#   PADDED Flag (1),
//#   END_HEADERS Flag (1),
//#   Unused Flag (1),
//#   END_STREAM Flag (1),
//#
//#   Reserved (1),
//#   Stream Identifier (31),
//#
//#   [Pad Length (8)],
//#   [Exclusive (1)],
//#   [Stream Dependency (31)],
//#   [Weight (8)],
//#   Field Block Fragment (..),
//#   Padding (..2040),
//# }

/// Marks the frame as the last the endpoint will send for the stream
pub const END_STREAM: u8 = 0x01;

/// Indicates that the frame carries the entire field block
pub const END_HEADERS: u8 = 0x04;

/// Indicates that the Pad Length field and padding are present
pub const PADDED: u8 = 0x08;

/// Indicates that the priority fields are present
pub const PRIORITY: u8 = 0x20;

/// A HEADERS frame carrying an (opaque) field block fragment
#[derive(Debug, PartialEq, Eq)]
pub struct Headers<'a> {
    /// The stream the field block belongs to
    pub stream_id: StreamId,

    /// The priority triple, when the PRIORITY flag is set
    pub priority: Option<Priority>,

    /// The encoded field block fragment. Decompression is the header
    /// decoder's concern, not the framing layer's.
    pub fragment: &'a [u8],

    /// The total number of padding octets, including the Pad Length octet
    pub padding: usize,

    /// If true, the frame marks the end of the stream from the peer
    pub end_stream: bool,

    /// If true, the field block is complete without CONTINUATION frames
    pub end_headers: bool,
}

impl<'a> Headers<'a> {
    pub const fn tag(&self) -> Tag {
        headers_tag!()
    }
}

decoder_parameterized_value!(
    impl<'a> Headers<'a> {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.2
            //# If a HEADERS frame is received whose Stream Identifier field is
            //# 0x00, the recipient MUST respond with a connection error
            //# (Section 5.4.1) of type PROTOCOL_ERROR.
            decoder_invariant!(
                !header.stream_id.is_connection_control(),
                "HEADERS frame on the connection control stream"
            );

            // the Pad Length octet precedes the priority fields, but the
            // padding bound can only be checked against what follows them
            let (pad_length, buffer) = if header.flag(PADDED) {
                let (pad_length, buffer) = buffer.decode::<u8>()?;
                (Some(pad_length as usize), buffer)
            } else {
                (None, buffer)
            };

            let (priority, buffer) = if header.flag(PRIORITY) {
                let (priority, buffer) = buffer.decode::<Priority>()?;
                (Some(priority), buffer)
            } else {
                (None, buffer)
            };

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

            let frame = Headers {
                stream_id: header.stream_id,
                priority,
                fragment,
                padding: if header.flag(PADDED) { pad_length + 1 } else { 0 },
                end_stream: header.flag(END_STREAM),
                end_headers: header.flag(END_HEADERS),
            };

            Ok((frame, buffer))
        }
    }
);

impl<'a> EncoderValue for Headers<'a> {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let mut flags = 0;
        let mut length = self.fragment.len() + self.padding;

        if self.end_stream {
            flags |= END_STREAM;
        }
        if self.end_headers {
            flags |= END_HEADERS;
        }
        if self.padding > 0 {
            flags |= PADDED;
        }
        if self.priority.is_some() {
            flags |= PRIORITY;
            length += 5;
        }

        let header = FrameHeader::new(length as u32, self.tag(), flags, self.stream_id);
        buffer.encode(&header);

        if self.padding > 0 {
            buffer.encode(&((self.padding - 1) as u8));
        }
        if let Some(priority) = &self.priority {
            buffer.encode(priority);
        }
        buffer.write_slice(self.fragment);
        if self.padding > 0 {
            buffer.write_repeated(self.padding - 1, 0);
        }
    }
}
