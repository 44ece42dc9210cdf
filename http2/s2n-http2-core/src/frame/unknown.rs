// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{decoder_parameterized_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-5.5
//# Implementations MUST ignore unknown or unsupported values in all
//# extensible protocol elements.

/// A frame of a type this implementation does not define.
///
/// Unknown frames never affect connection or stream state, but they are
/// surfaced to the listener for extension handling.
#[derive(Debug, PartialEq, Eq)]
pub struct Unknown<'a> {
    /// The 8-bit type of the frame
    pub frame_type: Tag,

    /// The stream the frame is associated with
    pub stream_id: StreamId,

    /// The flags of the frame, uninterpreted
    pub flags: u8,

    /// The raw frame payload
    pub payload: &'a [u8],
}

decoder_parameterized_value!(
    impl<'a> Unknown<'a> {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            let len = buffer.len();
            let (payload, buffer) = buffer.decode_slice(len)?;

            #[allow(clippy::all)]
            let payload = &payload.into_less_safe_slice()[..];

            let frame = Unknown {
                frame_type: header.frame_type,
                stream_id: header.stream_id,
                flags: header.flags,
                payload,
            };

            Ok((frame, buffer))
        }
    }
);

impl<'a> EncoderValue for Unknown<'a> {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let header = FrameHeader::new(
            self.payload.len() as u32,
            self.frame_type,
            self.flags,
            self.stream_id,
        );
        buffer.encode(&header);
        buffer.write_slice(self.payload);
    }
}
