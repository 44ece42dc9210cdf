// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    frame::{FrameHeader, Tag},
    stream::StreamId,
};
use s2n_codec::{decoder_invariant, decoder_parameterized_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.10
//# The CONTINUATION frame (type=0x09) is used to continue a sequence of
//# field block fragments (Section 4.3).  Any number of CONTINUATION
//# frames can be sent, as long as the preceding frame is on the same
//# stream and is a HEADERS, PUSH_PROMISE, or CONTINUATION frame without
//# the END_HEADERS flag set.

macro_rules! continuation_tag {
    () => {
        0x09u8
    };
}

/// Indicates that the field block is complete
pub const END_HEADERS: u8 = 0x04;

/// A continuation of a field block started by HEADERS or PUSH_PROMISE
#[derive(Debug, PartialEq, Eq)]
pub struct Continuation<'a> {
    /// The stream the field block belongs to
    pub stream_id: StreamId,

    /// The next fragment of the field block
    pub fragment: &'a [u8],

    /// If true, this fragment completes the field block
    pub end_headers: bool,
}

impl<'a> Continuation<'a> {
    pub const fn tag(&self) -> Tag {
        continuation_tag!()
    }
}

decoder_parameterized_value!(
    impl<'a> Continuation<'a> {
        fn decode(header: FrameHeader, buffer: Buffer) -> Result<Self> {
            decoder_invariant!(
                !header.stream_id.is_connection_control(),
                "CONTINUATION frame on the connection control stream"
            );

            let len = buffer.len();
            let (fragment, buffer) = buffer.decode_slice(len)?;

            #[allow(clippy::all)]
            let fragment = &fragment.into_less_safe_slice()[..];

            let frame = Continuation {
                stream_id: header.stream_id,
                fragment,
                end_headers: header.flag(END_HEADERS),
            };

            Ok((frame, buffer))
        }
    }
);

impl<'a> EncoderValue for Continuation<'a> {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let flags = if self.end_headers { END_HEADERS } else { 0 };
        let header = FrameHeader::new(
            self.fragment.len() as u32,
            self.tag(),
            flags,
            self.stream_id,
        );
        buffer.encode(&header);
        buffer.write_slice(self.fragment);
    }
}
