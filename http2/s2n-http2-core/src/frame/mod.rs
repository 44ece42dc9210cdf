// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! HTTP/2 framing layer
//!
//! Each frame kind lives in its own module and knows how to decode its
//! payload from a buffer that has been sliced to the advertised frame
//! length, and how to encode itself as a complete frame including the
//! 9-octet header.

use crate::{error::ConnectionError, stream::StreamId};
use s2n_codec::{decoder_value, u24, DecoderBuffer, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-4.1
//# All frames begin with a fixed 9-octet header followed by a variable-
//# length frame payload.
//#
//# HTTP Frame {
//#   Length (24),
//#   Type (8),
//#   Flags (8),
//#   Reserved (1),
//#   Stream Identifier (31),
//#   Frame Payload (..),
//# }

pub(crate) type Tag = u8;

// Decodes the optional Pad Length octet and trailing padding shared by
// DATA, HEADERS, and PUSH_PROMISE. Yields the unpadded payload slice, the
// total padding octets (including the Pad Length octet), and the remaining
// buffer.
macro_rules! decode_padded_payload {
    ($header:expr, $buffer:ident) => {{
        let buffer = $buffer;
        if $header.flag(PADDED) {
            let (pad_length, buffer) = buffer.decode::<u8>()?;
            let pad_length = pad_length as usize;

            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.1
            //# If the length of the padding is the length of the frame
            //# payload or greater, the recipient MUST treat this as a
            //# connection error (Section 5.4.1) of type PROTOCOL_ERROR.
            s2n_codec::decoder_invariant!(
                pad_length <= buffer.len(),
                "padding exceeds the frame payload"
            );

            let data_len = buffer.len() - pad_length;
            let (data, buffer) = buffer.decode_slice(data_len)?;
            let buffer = buffer.skip(pad_length)?;

            // newer versions of clippy complain about redundant slicing
            // but we don't know if this is a `&slice` or `&mut slice`
            #[allow(clippy::all)]
            let data = &data.into_less_safe_slice()[..];

            (data, pad_length + 1, buffer)
        } else {
            let len = buffer.len();
            let (data, buffer) = buffer.decode_slice(len)?;

            #[allow(clippy::all)]
            let data = &data.into_less_safe_slice()[..];

            (data, 0usize, buffer)
        }
    }};
}

#[macro_use]
pub mod data;
#[macro_use]
pub mod headers;
#[macro_use]
pub mod priority;
#[macro_use]
pub mod reset_stream;
#[macro_use]
pub mod settings;
#[macro_use]
pub mod push_promise;
#[macro_use]
pub mod ping;
#[macro_use]
pub mod go_away;
#[macro_use]
pub mod window_update;
#[macro_use]
pub mod continuation;
pub mod unknown;

pub use continuation::Continuation;
pub use data::Data;
pub use go_away::GoAway;
pub use headers::Headers;
pub use ping::Ping;
pub use priority::{Priority, PriorityFrame, DEFAULT_PRIORITY_WEIGHT};
pub use push_promise::PushPromise;
pub use reset_stream::ResetStream;
pub use settings::SettingsFrame;
pub use unknown::Unknown;
pub use window_update::WindowUpdate;

/// The length of the fixed frame header
pub const FRAME_HEADER_LEN: usize = 9;

/// The fixed 9-octet header present on every frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// The length of the frame payload in octets
    pub length: u32,
    /// The 8-bit type of the frame
    pub frame_type: Tag,
    /// Flags specific to the frame type
    pub flags: u8,
    /// The stream the frame is associated with
    pub stream_id: StreamId,
}

impl FrameHeader {
    /// Creates a new `FrameHeader` with the specified information
    #[inline]
    pub const fn new(length: u32, frame_type: Tag, flags: u8, stream_id: StreamId) -> Self {
        Self {
            length,
            frame_type,
            flags,
            stream_id,
        }
    }

    /// Returns true if the given flag bit is set
    #[inline]
    pub const fn flag(&self, flag: u8) -> bool {
        self.flags & flag == flag
    }
}

decoder_value!(
    impl<'a> FrameHeader {
        fn decode(buffer: Buffer) -> Result<Self> {
            let (length, buffer) = buffer.decode::<u24>()?;
            let (frame_type, buffer) = buffer.decode::<u8>()?;
            let (flags, buffer) = buffer.decode::<u8>()?;
            let (stream_id, buffer) = buffer.decode::<StreamId>()?;

            let header = FrameHeader {
                length: length.into(),
                frame_type,
                flags,
                stream_id,
            };

            Ok((header, buffer))
        }
    }
);

impl EncoderValue for FrameHeader {
    #[inline]
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        // frame constructors keep lengths below 2^24
        buffer.encode(&u24::new_truncated(self.length));
        buffer.encode(&self.frame_type);
        buffer.encode(&self.flags);
        buffer.encode(&self.stream_id);
    }
}

/// A fully decoded HTTP/2 frame
#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    Data(Data<'a>),
    Headers(Headers<'a>),
    Priority(PriorityFrame),
    ResetStream(ResetStream),
    Settings(SettingsFrame),
    PushPromise(PushPromise<'a>),
    Ping(Ping),
    GoAway(GoAway<'a>),
    WindowUpdate(WindowUpdate),
    Continuation(Continuation<'a>),
    Unknown(Unknown<'a>),
}

impl<'a> Frame<'a> {
    /// Decodes the payload for the given frame header.
    ///
    /// `payload` must already be sliced to exactly `header.length` octets;
    /// the full slice is consumed.
    pub fn decode(
        header: FrameHeader,
        payload: DecoderBuffer<'a>,
    ) -> Result<Frame<'a>, ConnectionError> {
        let (frame, remaining) = match header.frame_type {
            data_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::Data(frame), payload)
            }
            headers_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::Headers(frame), payload)
            }
            priority_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::Priority(frame), payload)
            }
            reset_stream_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::ResetStream(frame), payload)
            }
            settings_tag!() => {
                let (frame, payload) = SettingsFrame::decode(header, payload)?;
                (Frame::Settings(frame), payload)
            }
            push_promise_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::PushPromise(frame), payload)
            }
            ping_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::Ping(frame), payload)
            }
            go_away_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::GoAway(frame), payload)
            }
            window_update_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::WindowUpdate(frame), payload)
            }
            continuation_tag!() => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::Continuation(frame), payload)
            }
            //= https://www.rfc-editor.org/rfc/rfc9113#section-4.1
            //# Implementations MUST ignore and discard frames of unknown
            //# types.
            _ => {
                let (frame, payload) = payload.decode_parameterized(header)?;
                (Frame::Unknown(frame), payload)
            }
        };

        remaining.ensure_empty()?;

        Ok(frame)
    }

    /// Returns the type tag for the frame
    pub fn tag(&self) -> Tag {
        match self {
            Frame::Data(_) => data_tag!(),
            Frame::Headers(_) => headers_tag!(),
            Frame::Priority(_) => priority_tag!(),
            Frame::ResetStream(_) => reset_stream_tag!(),
            Frame::Settings(_) => settings_tag!(),
            Frame::PushPromise(_) => push_promise_tag!(),
            Frame::Ping(_) => ping_tag!(),
            Frame::GoAway(_) => go_away_tag!(),
            Frame::WindowUpdate(_) => window_update_tag!(),
            Frame::Continuation(_) => continuation_tag!(),
            Frame::Unknown(frame) => frame.frame_type,
        }
    }

    /// Returns the stream the frame is associated with
    pub fn stream_id(&self) -> StreamId {
        match self {
            Frame::Data(frame) => frame.stream_id,
            Frame::Headers(frame) => frame.stream_id,
            Frame::Priority(frame) => frame.stream_id,
            Frame::ResetStream(frame) => frame.stream_id,
            Frame::Settings(_) => StreamId::CONNECTION,
            Frame::PushPromise(frame) => frame.stream_id,
            Frame::Ping(_) => StreamId::CONNECTION,
            Frame::GoAway(_) => StreamId::CONNECTION,
            Frame::WindowUpdate(frame) => frame.stream_id,
            Frame::Continuation(frame) => frame.stream_id,
            Frame::Unknown(frame) => frame.stream_id,
        }
    }
}

impl<'a> EncoderValue for Frame<'a> {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        match self {
            Frame::Data(frame) => buffer.encode(frame),
            Frame::Headers(frame) => buffer.encode(frame),
            Frame::Priority(frame) => buffer.encode(frame),
            Frame::ResetStream(frame) => buffer.encode(frame),
            Frame::Settings(frame) => buffer.encode(frame),
            Frame::PushPromise(frame) => buffer.encode(frame),
            Frame::Ping(frame) => buffer.encode(frame),
            Frame::GoAway(frame) => buffer.encode(frame),
            Frame::WindowUpdate(frame) => buffer.encode(frame),
            Frame::Continuation(frame) => buffer.encode(frame),
            Frame::Unknown(frame) => buffer.encode(frame),
        }
    }
}

#[cfg(test)]
mod tests;
