// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{decoder_invariant, decoder_parameterized_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.1
//# DATA frames (type=0x00) convey arbitrary, variable-length sequences
//# of octets associated with a stream.

macro_rules! data_tag {
    () => {
        0x00u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.1
//# DATA Frame {
//#   Length (24),
//#   Type (8) = 0x00,
//#
//#   Unused Flags (4),
//#   PADDED Flag (1),
//#   Unused Flags (2),
//#   END_STREAM Flag (1),
//#
//#   Reserved (1),
//#   Stream Identifier (31),
//#
//#   [Pad Length (8)],
//#   Data (..),
//#   Padding (..2040),
//# }

/// Marks the frame as the last the endpoint will send for the stream
pub const END_STREAM: u8 = 0x01;

/// Indicates that the Pad Length field and padding are present
pub const PADDED: u8 = 0x08;

/// The only flow-controlled frame kind
#[derive(Debug, PartialEq, Eq)]
pub struct Data<'a> {
    /// The stream the data belongs to
    pub stream_id: StreamId,

    /// The application octets carried by the frame
    pub data: &'a [u8],

    /// The total number of padding octets, including the Pad Length octet
    /// when present. Padding counts against flow control.
    pub padding: usize,

    /// If true, the frame marks the end of the stream from the peer
    pub end_stream: bool,
}

impl<'a> Data<'a> {
    pub const fn tag(&self) -> Tag {
        data_tag!()
    }

    /// The number of octets the frame counts against flow-control windows
    #[inline]
    pub fn flow_controlled_len(&self) -> usize {
        self.data.len() + self.padding
    }
}

decoder_parameterized_value!(
    impl<'a> Data<'a> {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.1
            //# If a DATA frame is received whose Stream Identifier field is
            //# 0x00, the recipient MUST respond with a connection error
            //# (Section 5.4.1) of type PROTOCOL_ERROR.
            decoder_invariant!(
                !header.stream_id.is_connection_control(),
                "DATA frame on the connection control stream"
            );

            let (data, padding, buffer) = decode_padded_payload!(header, buffer);

            let frame = Data {
                stream_id: header.stream_id,
                data,
                padding,
                end_stream: header.flag(END_STREAM),
            };

            Ok((frame, buffer))
        }
    }
);

impl<'a> EncoderValue for Data<'a> {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let mut flags = 0;
        if self.end_stream {
            flags |= END_STREAM;
        }
        if self.padding > 0 {
            flags |= PADDED;
        }

        let header = FrameHeader::new(
            self.flow_controlled_len() as u32,
            self.tag(),
            flags,
            self.stream_id,
        );
        buffer.encode(&header);

        if self.padding > 0 {
            buffer.encode(&((self.padding - 1) as u8));
            buffer.write_slice(self.data);
            buffer.write_repeated(self.padding - 1, 0);
        } else {
            buffer.write_slice(self.data);
        }
    }
}
