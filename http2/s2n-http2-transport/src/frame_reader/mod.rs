// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Incremental frame reader
//!
//! Consumes raw connection bytes and produces assembled, well-formed
//! frame events. Header blocks split across CONTINUATION frames are
//! buffered here and delivered as one event, so the dispatch core never
//! sees a partial field block.

use core::ops::Deref;
use s2n_codec::{DecoderBuffer, DecoderError};
use s2n_http2_core::{
    connection_error,
    error::{ConnectionError, Error, ErrorCode},
    frame::{
        priority::PRIORITY_PAYLOAD_LEN, Data, Frame, FrameHeader, Ping, Priority, PriorityFrame,
        ResetStream, Unknown, WindowUpdate, FRAME_HEADER_LEN,
    },
    settings::{self, Settings},
    stream::StreamId,
    stream_error,
};

// frame-type tags the reader needs ahead of payload decoding
const PRIORITY_FRAME_TYPE: u8 = 0x02;

/// A complete field block, either borrowed from the input or assembled
/// from CONTINUATION fragments
#[derive(Debug)]
pub enum HeaderBlock<'a> {
    Slice(&'a [u8]),
    Assembled(Vec<u8>),
}

impl HeaderBlock<'_> {
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Slice(block) => block,
            Self::Assembled(block) => block,
        }
    }
}

impl Deref for HeaderBlock<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

/// An assembled frame event, ready for dispatch
#[derive(Debug)]
pub enum ReadFrame<'a> {
    Data(Data<'a>),
    Headers {
        stream_id: StreamId,
        priority: Option<Priority>,
        block: HeaderBlock<'a>,
        padding: usize,
        end_of_stream: bool,
    },
    Priority(PriorityFrame),
    ResetStream(ResetStream),
    Settings(Settings),
    SettingsAck,
    PushPromise {
        stream_id: StreamId,
        promised_stream_id: StreamId,
        block: HeaderBlock<'a>,
        padding: usize,
    },
    Ping(Ping),
    GoAway {
        last_stream_id: StreamId,
        error_code: ErrorCode,
        debug_data: &'a [u8],
    },
    WindowUpdate(WindowUpdate),
    Unknown(Unknown<'a>),
}

#[derive(Debug)]
enum ContinuationKind {
    Headers {
        priority: Option<Priority>,
        padding: usize,
        end_of_stream: bool,
    },
    PushPromise {
        promised_stream_id: StreamId,
        padding: usize,
    },
}

#[derive(Debug)]
struct HeadersContinuation {
    stream_id: StreamId,
    kind: ContinuationKind,
    block: Vec<u8>,
}

impl HeadersContinuation {
    fn into_read_frame(self) -> ReadFrame<'static> {
        match self.kind {
            ContinuationKind::Headers {
                priority,
                padding,
                end_of_stream,
            } => ReadFrame::Headers {
                stream_id: self.stream_id,
                priority,
                block: HeaderBlock::Assembled(self.block),
                padding,
                end_of_stream,
            },
            ContinuationKind::PushPromise {
                promised_stream_id,
                padding,
            } => ReadFrame::PushPromise {
                stream_id: self.stream_id,
                promised_stream_id,
                block: HeaderBlock::Assembled(self.block),
                padding,
            },
        }
    }
}

/// Reads one frame at a time from a caller-managed input buffer.
///
/// The reader also owns the inbound header-table and frame-size policy
/// configuration, which the decoder surfaces through its local-settings
/// accessors.
#[derive(Debug)]
pub struct FrameReader {
    max_frame_size: u32,
    header_table_size: u32,
    max_header_list_size: Option<u32>,
    continuation: Option<HeadersContinuation>,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self {
            max_frame_size: settings::DEFAULT_MAX_FRAME_SIZE,
            header_table_size: settings::DEFAULT_HEADER_TABLE_SIZE,
            max_header_list_size: None,
            continuation: None,
        }
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    #[inline]
    pub fn set_max_frame_size(&mut self, size: u32) {
        self.max_frame_size = size;
    }

    #[inline]
    pub fn header_table_size(&self) -> u32 {
        self.header_table_size
    }

    #[inline]
    pub fn set_header_table_size(&mut self, size: u32) {
        self.header_table_size = size;
    }

    #[inline]
    pub fn max_header_list_size(&self) -> Option<u32> {
        self.max_header_list_size
    }

    #[inline]
    pub fn set_max_header_list_size(&mut self, size: u32) {
        self.max_header_list_size = Some(size);
    }

    /// Releases buffered header-block fragments
    pub fn close(&mut self) {
        self.continuation = None;
    }

    /// Reads the next frame from `input`.
    ///
    /// Returns `Ok(None)` without consuming anything when the input does
    /// not yet hold a complete frame. A complete frame is consumed from
    /// `input` even when its validation fails, so the caller can continue
    /// reading after a stream-level error. `Ok(None)` with consumed input
    /// means a header-block fragment was buffered.
    pub fn read_frame<'a>(
        &mut self,
        input: &mut &'a [u8],
    ) -> Result<Option<ReadFrame<'a>>, Error> {
        let buffer = DecoderBuffer::new(*input);

        let (header, remaining) = match buffer.decode::<FrameHeader>() {
            Ok(decoded) => decoded,
            Err(DecoderError::UnexpectedEof(_)) => return Ok(None),
            Err(error) => return Err(ConnectionError::from(error).into()),
        };

        //= https://www.rfc-editor.org/rfc/rfc9113#section-4.2
        //# An endpoint MUST send an error code of FRAME_SIZE_ERROR if a
        //# frame exceeds the size defined in SETTINGS_MAX_FRAME_SIZE
        if header.length > self.max_frame_size {
            return Err(connection_error!(
                FRAME_SIZE_ERROR,
                "frame exceeds the advertised SETTINGS_MAX_FRAME_SIZE"
            )
            .into());
        }

        let length = header.length as usize;
        if remaining.len() < length {
            return Ok(None);
        }

        // the frame is complete; consume it even if validation fails so
        // the connection can survive stream-level errors
        *input = &input[FRAME_HEADER_LEN + length..];

        //= https://www.rfc-editor.org/rfc/rfc9113#section-6.3
        //# A PRIORITY frame with a length other than 5 octets MUST be
        //# treated as a stream error (Section 5.4.2) of type
        //# FRAME_SIZE_ERROR.
        if header.frame_type == PRIORITY_FRAME_TYPE && length != PRIORITY_PAYLOAD_LEN {
            return Err(stream_error!(
                header.stream_id,
                FRAME_SIZE_ERROR,
                "PRIORITY frame with an invalid length"
            )
            .into());
        }

        let (payload, _) = remaining
            .decode_slice(length)
            .map_err(ConnectionError::from)?;

        let frame = Frame::decode(header, payload)?;

        self.assemble(frame)
    }

    fn assemble<'a>(&mut self, frame: Frame<'a>) -> Result<Option<ReadFrame<'a>>, Error> {
        //= https://www.rfc-editor.org/rfc/rfc9113#section-6.10
        //# A receiver MUST treat the receipt of any other type of frame or
        //# a frame on a different stream as a connection error
        //# (Section 5.4.1) of type PROTOCOL_ERROR.
        if let Some(continuation) = &self.continuation {
            match &frame {
                Frame::Continuation(frame) if frame.stream_id == continuation.stream_id => {}
                _ => {
                    return Err(connection_error!(
                        PROTOCOL_ERROR,
                        "frame interleaved in a header block"
                    )
                    .into())
                }
            }
        }

        match frame {
            Frame::Data(frame) => Ok(Some(ReadFrame::Data(frame))),
            Frame::Headers(frame) => {
                verify_dependency(frame.stream_id, &frame.priority)?;

                if frame.end_headers {
                    Ok(Some(ReadFrame::Headers {
                        stream_id: frame.stream_id,
                        priority: frame.priority,
                        block: HeaderBlock::Slice(frame.fragment),
                        padding: frame.padding,
                        end_of_stream: frame.end_stream,
                    }))
                } else {
                    self.continuation = Some(HeadersContinuation {
                        stream_id: frame.stream_id,
                        kind: ContinuationKind::Headers {
                            priority: frame.priority,
                            padding: frame.padding,
                            end_of_stream: frame.end_stream,
                        },
                        block: frame.fragment.to_vec(),
                    });
                    Ok(None)
                }
            }
            Frame::Priority(frame) => {
                verify_dependency(frame.stream_id, &Some(frame.priority))?;
                Ok(Some(ReadFrame::Priority(frame)))
            }
            Frame::ResetStream(frame) => Ok(Some(ReadFrame::ResetStream(frame))),
            Frame::Settings(frame) => Ok(Some(if frame.ack {
                ReadFrame::SettingsAck
            } else {
                ReadFrame::Settings(frame.settings)
            })),
            Frame::PushPromise(frame) => {
                if frame.end_headers {
                    Ok(Some(ReadFrame::PushPromise {
                        stream_id: frame.stream_id,
                        promised_stream_id: frame.promised_stream_id,
                        block: HeaderBlock::Slice(frame.fragment),
                        padding: frame.padding,
                    }))
                } else {
                    self.continuation = Some(HeadersContinuation {
                        stream_id: frame.stream_id,
                        kind: ContinuationKind::PushPromise {
                            promised_stream_id: frame.promised_stream_id,
                            padding: frame.padding,
                        },
                        block: frame.fragment.to_vec(),
                    });
                    Ok(None)
                }
            }
            Frame::Ping(frame) => Ok(Some(ReadFrame::Ping(frame))),
            Frame::GoAway(frame) => Ok(Some(ReadFrame::GoAway {
                last_stream_id: frame.last_stream_id,
                error_code: frame.error_code,
                debug_data: frame.debug_data,
            })),
            Frame::WindowUpdate(frame) => Ok(Some(ReadFrame::WindowUpdate(frame))),
            Frame::Continuation(frame) => {
                let mut continuation = match self.continuation.take() {
                    Some(continuation) => continuation,
                    None => {
                        return Err(connection_error!(
                            PROTOCOL_ERROR,
                            "CONTINUATION without a preceding HEADERS or PUSH_PROMISE"
                        )
                        .into())
                    }
                };

                continuation.block.extend_from_slice(frame.fragment);

                if frame.end_headers {
                    Ok(Some(continuation.into_read_frame()))
                } else {
                    self.continuation = Some(continuation);
                    Ok(None)
                }
            }
            Frame::Unknown(frame) => Ok(Some(ReadFrame::Unknown(frame))),
        }
    }
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-5.3.1
//# A stream cannot depend on itself.  An endpoint MUST treat this as a
//# stream error (Section 5.4.2) of type PROTOCOL_ERROR.
fn verify_dependency(stream_id: StreamId, priority: &Option<Priority>) -> Result<(), Error> {
    if let Some(priority) = priority {
        if priority.dependency == stream_id {
            return Err(stream_error!(
                stream_id,
                PROTOCOL_ERROR,
                "a stream cannot depend on itself"
            )
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use s2n_codec::EncoderValue;
    use s2n_http2_core::frame::{Continuation, Headers};

    fn id(id: u32) -> StreamId {
        StreamId::new(id).unwrap()
    }

    fn read_all<'a>(reader: &mut FrameReader, mut input: &'a [u8]) -> Vec<ReadFrame<'a>> {
        let mut frames = vec![];
        loop {
            let before = input.len();
            match reader.read_frame(&mut input).unwrap() {
                Some(frame) => frames.push(frame),
                None if input.len() == before => break,
                None => {}
            }
        }
        frames
    }

    #[test]
    fn incomplete_input_is_not_consumed() {
        let mut reader = FrameReader::new();
        let frame = Frame::Ping(Ping {
            ack: false,
            data: [7; 8],
        });
        let bytes = frame.encode_to_vec();

        let mut input = &bytes[..bytes.len() - 1];
        let before = input.len();
        assert!(reader.read_frame(&mut input).unwrap().is_none());
        assert_eq!(input.len(), before);

        let mut input = &bytes[..];
        assert!(matches!(
            reader.read_frame(&mut input).unwrap(),
            Some(ReadFrame::Ping(_))
        ));
        assert!(input.is_empty());
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut reader = FrameReader::new();
        reader.set_max_frame_size(16);

        let payload = vec![0u8; 17];
        let frame = Frame::Data(Data {
            stream_id: id(1),
            data: &payload,
            padding: 0,
            end_stream: false,
        });
        let bytes = frame.encode_to_vec();

        let mut input = &bytes[..];
        let error = reader.read_frame(&mut input).unwrap_err();
        assert_eq!(error.code(), ErrorCode::FRAME_SIZE_ERROR);
        assert!(error.is_connection_error());
    }

    #[test]
    fn continuation_assembly() {
        let mut reader = FrameReader::new();

        let mut bytes = Frame::Headers(Headers {
            stream_id: id(1),
            priority: None,
            fragment: b"abc",
            padding: 0,
            end_stream: true,
            end_headers: false,
        })
        .encode_to_vec();
        bytes.extend_from_slice(
            &Frame::Continuation(Continuation {
                stream_id: id(1),
                fragment: b"def",
                end_headers: false,
            })
            .encode_to_vec(),
        );
        bytes.extend_from_slice(
            &Frame::Continuation(Continuation {
                stream_id: id(1),
                fragment: b"ghi",
                end_headers: true,
            })
            .encode_to_vec(),
        );

        let frames = read_all(&mut reader, &bytes);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            ReadFrame::Headers {
                stream_id,
                block,
                end_of_stream,
                ..
            } => {
                assert_eq!(*stream_id, id(1));
                assert_eq!(block.as_slice(), b"abcdefghi");
                assert!(end_of_stream);
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn interleaved_frame_fails_the_connection() {
        let mut reader = FrameReader::new();

        let mut bytes = Frame::Headers(Headers {
            stream_id: id(1),
            priority: None,
            fragment: b"abc",
            padding: 0,
            end_stream: false,
            end_headers: false,
        })
        .encode_to_vec();
        bytes.extend_from_slice(
            &Frame::Ping(Ping {
                ack: false,
                data: [0; 8],
            })
            .encode_to_vec(),
        );

        let mut input = &bytes[..];
        assert!(reader.read_frame(&mut input).unwrap().is_none());
        let error = reader.read_frame(&mut input).unwrap_err();
        assert!(error.is_connection_error());
        assert_eq!(error.code(), ErrorCode::PROTOCOL_ERROR);
    }

    #[test]
    fn stray_continuation_fails_the_connection() {
        let mut reader = FrameReader::new();
        let bytes = Frame::Continuation(Continuation {
            stream_id: id(1),
            fragment: b"abc",
            end_headers: true,
        })
        .encode_to_vec();

        let mut input = &bytes[..];
        let error = reader.read_frame(&mut input).unwrap_err();
        assert!(error.is_connection_error());
    }

    #[test]
    fn self_dependency_is_a_stream_error() {
        let mut reader = FrameReader::new();
        let bytes = Frame::Priority(PriorityFrame {
            stream_id: id(3),
            priority: Priority {
                dependency: id(3),
                weight: 16,
                exclusive: false,
            },
        })
        .encode_to_vec();

        let mut input = &bytes[..];
        let error = reader.read_frame(&mut input).unwrap_err();
        assert_eq!(error.stream_id(), Some(id(3)));
        // the offending frame was consumed; the connection keeps reading
        assert!(input.is_empty());
    }

    #[test]
    fn priority_length_is_a_stream_error() {
        let mut reader = FrameReader::new();
        // PRIORITY frame with a 4-octet payload
        let bytes = [0, 0, 4, 0x2, 0, 0, 0, 0, 3, 0, 0, 0, 1];

        let mut input = &bytes[..];
        let error = reader.read_frame(&mut input).unwrap_err();
        assert_eq!(error.stream_id(), Some(id(3)));
        assert_eq!(error.code(), ErrorCode::FRAME_SIZE_ERROR);
    }
}
