//! # RESP protocol codec
//!
//! A streaming decoder for the subset of RESP the server accepts from
//! clients: multi-bulk arrays (`*N\r\n$len\r\nbytes\r\n...`), the shape every
//! real client speaks. The decoder keeps its progress in `ReadState` so a
//! partial frame straddling two TCP reads just resumes next time `decode` is
//! called, mirroring the incremental parser state (`reading_multi`,
//! `expected_args`, `msg_type`, `args`, `bulk_len`).
use crate::value::Value;
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

#[derive(Debug, Default)]
struct ReadState {
    reading_multi: bool,
    expected_args: usize,
    bulk_len: Option<usize>,
    args: Vec<Bytes>,
}

impl ReadState {
    fn finished(&self) -> bool {
        self.expected_args > 0 && self.args.len() == self.expected_args
    }
}

/// Codec for the Redis wire protocol: decodes multi-bulk requests, encodes
/// [`Value`] replies.
#[derive(Debug, Default)]
pub struct RespCodec {
    state: ReadState,
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

impl Decoder for RespCodec {
    type Item = Vec<Bytes>;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Self::Item>> {
        loop {
            if let Some(bulk_len) = self.state.bulk_len {
                if src.len() < bulk_len + 2 {
                    return Ok(None);
                }
                let data = Bytes::copy_from_slice(&src[..bulk_len]);
                if &src[bulk_len..bulk_len + 2] != b"\r\n" {
                    self.state = ReadState::default();
                    return Err(protocol_error("'\\r\\n'", "malformed bulk string terminator"));
                }
                src.advance(bulk_len + 2);
                self.state.args.push(data);
                self.state.bulk_len = None;

                if self.state.finished() {
                    let args = std::mem::take(&mut self.state.args);
                    self.state = ReadState::default();
                    return Ok(Some(args));
                }
                continue;
            }

            let line_end = match find_crlf(src) {
                Some(pos) => pos,
                None => return Ok(None),
            };
            let line = src[..line_end].to_vec();
            src.advance(line_end + 2);

            if !self.state.reading_multi {
                if line.first() != Some(&b'*') {
                    self.state = ReadState::default();
                    return Err(protocol_error("'*'", &String::from_utf8_lossy(&line)));
                }
                let count: i64 = match parse_int(&line[1..]) {
                    Ok(n) => n,
                    Err(e) => {
                        self.state = ReadState::default();
                        return Err(e);
                    }
                };
                if count <= 0 {
                    self.state = ReadState::default();
                    return Ok(Some(vec![]));
                }
                self.state.reading_multi = true;
                self.state.expected_args = count as usize;
                continue;
            }

            if line.first() != Some(&b'$') {
                self.state = ReadState::default();
                return Err(protocol_error("'$'", &String::from_utf8_lossy(&line)));
            }
            let len: i64 = match parse_int(&line[1..]) {
                Ok(n) => n,
                Err(e) => {
                    self.state = ReadState::default();
                    return Err(e);
                }
            };
            if len < 0 {
                self.state = ReadState::default();
                return Err(protocol_error("non-negative bulk length", &len.to_string()));
            }
            self.state.bulk_len = Some(len as usize);
        }
    }
}

fn parse_int(raw: &[u8]) -> io::Result<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| protocol_error("an integer", &String::from_utf8_lossy(raw)))
}

/// A malformed frame. Carried as `io::ErrorKind::InvalidData` so the
/// connection handler can tell it apart from a genuine transport failure:
/// the decoder has already reset its own state, so the connection can stay
/// open and keep reading frames after reporting this one as an `-ERR` reply.
fn protocol_error(expected: &str, got: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("protocol error: expected {}, got '{}'", expected, got),
    )
}

impl Encoder<Value> for RespCodec {
    type Error = io::Error;

    fn encode(&mut self, value: Value, dst: &mut BytesMut) -> io::Result<()> {
        let bytes: Vec<u8> = value.into();
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_full_frame() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$1\r\na\r\n"[..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, vec![Bytes::from("GET"), Bytes::from("a")]);
        assert!(buf.is_empty());
    }

    #[test]
    fn returns_none_on_partial_frame() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$1\r\n"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"a\r\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, vec![Bytes::from("GET"), Bytes::from("a")]);
    }

    #[test]
    fn rejects_non_array_first_byte() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::from(&b"+PING\r\n"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn empty_array_yields_empty_frame() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::from(&b"*0\r\n"[..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn decoder_resyncs_after_a_malformed_frame() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::from(&b"+PING\r\n*1\r\n$4\r\nPING\r\n"[..]);

        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, vec![Bytes::from("PING")]);
    }
}
