// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::{error::ErrorCode, settings::Settings};
use bolero::check;
use s2n_codec::{DecoderBuffer, EncoderValue};

fn decode(bytes: &[u8]) -> Result<Frame, ConnectionError> {
    let buffer = DecoderBuffer::new(bytes);
    let (header, payload) = buffer
        .decode::<FrameHeader>()
        .map_err(ConnectionError::from)?;
    assert_eq!(payload.len(), header.length as usize, "test frame length");
    Frame::decode(header, payload)
}

fn round_trip(frame: Frame) {
    let bytes = frame.encode_to_vec();
    assert_eq!(decode(&bytes).unwrap(), frame);
}

fn stream_id(id: u32) -> StreamId {
    StreamId::new(id).unwrap()
}

#[test]
fn data_frame() {
    let mut bytes = vec![0, 0, 5, 0x0, 0x01, 0, 0, 0, 1];
    bytes.extend_from_slice(b"hello");

    let frame = decode(&bytes).unwrap();
    assert_eq!(
        frame,
        Frame::Data(Data {
            stream_id: stream_id(1),
            data: b"hello",
            padding: 0,
            end_stream: true,
        })
    );
    assert_eq!(frame.tag(), 0x0);
    assert_eq!(frame.stream_id(), stream_id(1));
}

#[test]
fn data_frame_with_padding() {
    // Pad Length = 2, three octets of data, two octets of padding
    let mut bytes = vec![0, 0, 6, 0x0, 0x08, 0, 0, 0, 3];
    bytes.push(2);
    bytes.extend_from_slice(b"abc");
    bytes.extend_from_slice(&[0, 0]);

    match decode(&bytes).unwrap() {
        Frame::Data(frame) => {
            assert_eq!(frame.data, b"abc");
            assert_eq!(frame.padding, 3);
            assert_eq!(frame.flow_controlled_len(), 6);
            assert!(!frame.end_stream);
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

#[test]
fn data_frame_padding_too_large() {
    // Pad Length = 5 but only three octets follow it
    let mut bytes = vec![0, 0, 4, 0x0, 0x08, 0, 0, 0, 3];
    bytes.push(5);
    bytes.extend_from_slice(b"abc");

    let error = decode(&bytes).unwrap_err();
    assert_eq!(error.code, ErrorCode::PROTOCOL_ERROR);
    assert_eq!(error.reason, "padding exceeds the frame payload");
}

#[test]
fn data_frame_on_stream_zero() {
    let bytes = vec![0, 0, 0, 0x0, 0, 0, 0, 0, 0];
    let error = decode(&bytes).unwrap_err();
    assert_eq!(error.code, ErrorCode::PROTOCOL_ERROR);
}

#[test]
fn headers_frame_with_priority() {
    let mut bytes = vec![0, 0, 9, 0x1, 0x20 | 0x04, 0, 0, 0, 5];
    bytes.extend_from_slice(&0x8000_0003u32.to_be_bytes());
    bytes.push(15);
    bytes.extend_from_slice(b"hdrs");

    match decode(&bytes).unwrap() {
        Frame::Headers(frame) => {
            assert_eq!(frame.stream_id, stream_id(5));
            assert_eq!(
                frame.priority,
                Some(Priority {
                    dependency: stream_id(3),
                    weight: 16,
                    exclusive: true,
                })
            );
            assert_eq!(frame.fragment, b"hdrs");
            assert!(frame.end_headers);
            assert!(!frame.end_stream);
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

#[test]
fn headers_frame_short_form_round_trip() {
    round_trip(Frame::Headers(Headers {
        stream_id: stream_id(7),
        priority: None,
        fragment: b"fragment",
        padding: 4,
        end_stream: true,
        end_headers: false,
    }));
}

#[test]
fn priority_frame() {
    round_trip(Frame::Priority(PriorityFrame {
        stream_id: stream_id(9),
        priority: Priority {
            dependency: stream_id(1),
            weight: 256,
            exclusive: false,
        },
    }));

    let default = Priority::default();
    assert_eq!(default.weight, DEFAULT_PRIORITY_WEIGHT);
    assert_eq!(default.dependency, StreamId::CONNECTION);
}

#[test]
fn reset_stream_frame() {
    round_trip(Frame::ResetStream(ResetStream {
        stream_id: stream_id(3),
        error_code: ErrorCode::CANCEL,
    }));
}

#[test]
fn settings_frame() {
    round_trip(Frame::Settings(SettingsFrame::new(
        Settings::EMPTY
            .with_max_concurrent_streams(128)
            .with_initial_window_size(1 << 20),
    )));
    round_trip(Frame::Settings(SettingsFrame::ack()));
}

#[test]
fn settings_ack_with_payload() {
    let mut bytes = vec![0, 0, 6, 0x4, 0x01, 0, 0, 0, 0];
    bytes.extend_from_slice(&[0, 3, 0, 0, 0, 1]);

    let error = decode(&bytes).unwrap_err();
    assert_eq!(error.code, ErrorCode::FRAME_SIZE_ERROR);
}

#[test]
fn settings_frame_on_non_zero_stream() {
    let bytes = vec![0, 0, 0, 0x4, 0, 0, 0, 0, 1];
    let error = decode(&bytes).unwrap_err();
    assert_eq!(error.code, ErrorCode::PROTOCOL_ERROR);
}

#[test]
fn push_promise_frame() {
    round_trip(Frame::PushPromise(PushPromise {
        stream_id: stream_id(3),
        promised_stream_id: stream_id(4),
        fragment: b"promise",
        padding: 0,
        end_headers: true,
    }));
}

#[test]
fn ping_frame() {
    let ping = Ping {
        ack: false,
        data: *b"\x00\x01\x02\x03\x04\x05\x06\x07",
    };
    round_trip(Frame::Ping(ping));

    let ack = ping.to_ack();
    assert!(ack.ack);
    assert_eq!(ack.data, ping.data);
}

#[test]
fn ping_frame_on_non_zero_stream() {
    let mut bytes = vec![0, 0, 8, 0x6, 0, 0, 0, 0, 1];
    bytes.extend_from_slice(&[0; 8]);
    let error = decode(&bytes).unwrap_err();
    assert_eq!(error.code, ErrorCode::PROTOCOL_ERROR);
}

#[test]
fn go_away_frame() {
    round_trip(Frame::GoAway(GoAway {
        last_stream_id: stream_id(99),
        error_code: ErrorCode::NO_ERROR,
        debug_data: b"going away",
    }));
}

#[test]
fn window_update_reserved_bit_is_masked() {
    let mut bytes = vec![0, 0, 4, 0x8, 0, 0, 0, 0, 1];
    bytes.extend_from_slice(&0x8000_0400u32.to_be_bytes());

    match decode(&bytes).unwrap() {
        Frame::WindowUpdate(frame) => {
            assert_eq!(frame.window_size_increment, 0x400);
            assert_eq!(frame.stream_id, stream_id(1));
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

#[test]
fn continuation_frame() {
    round_trip(Frame::Continuation(Continuation {
        stream_id: stream_id(5),
        fragment: b"rest of the block",
        end_headers: true,
    }));
}

#[test]
fn unknown_frame() {
    let mut bytes = vec![0, 0, 3, 0xa, 0x55, 0, 0, 0, 7];
    bytes.extend_from_slice(&[1, 2, 3]);

    match decode(&bytes).unwrap() {
        Frame::Unknown(frame) => {
            assert_eq!(frame.frame_type, 0xa);
            assert_eq!(frame.flags, 0x55);
            assert_eq!(frame.stream_id, stream_id(7));
            assert_eq!(frame.payload, &[1, 2, 3]);
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

#[test]
fn truncated_payload() {
    // RST_STREAM advertising four octets but carrying two
    let bytes = vec![0, 0, 2, 0x3, 0, 0, 0, 0, 3, 0, 0];
    let error = decode(&bytes).unwrap_err();
    assert_eq!(error.code, ErrorCode::FRAME_SIZE_ERROR);
}

#[test]
fn decode_does_not_panic() {
    check!().for_each(|bytes| {
        let buffer = DecoderBuffer::new(bytes);
        if let Ok((header, payload)) = buffer.decode::<FrameHeader>() {
            if payload.len() == header.length as usize {
                let _ = Frame::decode(header, payload);
            }
        }
    });
}
