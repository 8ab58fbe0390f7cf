use std::io::{self, ErrorKind, Read};
use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::snake::Direction;

const ESC: u8 = 0x1b;
const CSI: u8 = b'[';
const CTRL_C: u8 = 0x03;

/// Big enough for a few escape sequences arriving in the same read.
const READ_BUFFER_SIZE: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,
    Esc,
    Interrupt,
}

impl Button {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Button::UpArrow => Some(Direction::Up),
            Button::DownArrow => Some(Direction::Down),
            Button::LeftArrow => Some(Direction::Left),
            Button::RightArrow => Some(Direction::Right),
            Button::Esc | Button::Interrupt => None,
        }
    }

    pub fn is_quit(self) -> bool {
        matches!(self, Button::Esc | Button::Interrupt)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    Csi,
}

/// Turns raw terminal bytes into buttons. Sequences never span reads.
#[derive(Debug)]
pub struct Decoder {
    state: State,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder { state: State::Ground }
    }

    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Button> {
        let mut buttons = vec![];
        self.state = State::Ground;

        for &byte in chunk {
            self.state = match (self.state, byte) {
                (_, CTRL_C) => {
                    buttons.push(Button::Interrupt);
                    State::Ground
                }
                (_, ESC) => State::Escape,
                (State::Escape, CSI) => State::Csi,
                (State::Csi, b'A') => {
                    buttons.push(Button::UpArrow);
                    State::Ground
                }
                (State::Csi, b'B') => {
                    buttons.push(Button::DownArrow);
                    State::Ground
                }
                (State::Csi, b'C') => {
                    buttons.push(Button::RightArrow);
                    State::Ground
                }
                (State::Csi, b'D') => {
                    buttons.push(Button::LeftArrow);
                    State::Ground
                }
                _ => State::Ground,
            };
        }

        // Nothing followed the escape byte in this read
        if self.state == State::Escape {
            buttons.push(Button::Esc);
        }
        self.state = State::Ground;

        buttons
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads `stream` on its own thread until it fails or the receiver goes away.
/// A read failure (end of stream included) is forwarded as the last message.
pub fn spawn_reader<R>(
    stream: R,
    events: SyncSender<io::Result<Button>>,
) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || read_loop(stream, events))
}

fn read_loop<R: Read>(mut stream: R, events: SyncSender<io::Result<Button>>) {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut decoder = Decoder::new();

    loop {
        let cnt = match stream.read(&mut buffer) {
            Ok(0) => {
                let eof = io::Error::new(ErrorKind::UnexpectedEof, "input stream closed");
                let _ = events.send(Err(eof));
                return;
            }
            Ok(cnt) => cnt,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("keyboard read failed: {}", e);
                let _ = events.send(Err(e));
                return;
            }
        };

        for button in decoder.decode(&buffer[..cnt]) {
            debug!("key {:?}", button);
            if events.send(Ok(button)).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::mpsc::sync_channel;

    /// Hands out one queued chunk per read, then reports end of stream.
    struct Chunks(VecDeque<Vec<u8>>);

    impl Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Ok(0),
            }
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::Other, "device gone"))
        }
    }

    fn decode(bytes: &[u8]) -> Vec<Button> {
        Decoder::new().decode(bytes)
    }

    #[test]
    fn arrow_keys() {
        assert_eq!(decode(b"\x1b[A"), vec![Button::UpArrow]);
        assert_eq!(decode(b"\x1b[B"), vec![Button::DownArrow]);
        assert_eq!(decode(b"\x1b[C"), vec![Button::RightArrow]);
        assert_eq!(decode(b"\x1b[D"), vec![Button::LeftArrow]);
    }

    #[test]
    fn lone_escape_quits() {
        assert_eq!(decode(&[ESC]), vec![Button::Esc]);
        assert!(Button::Esc.is_quit());
    }

    #[test]
    fn incomplete_sequences_are_ignored() {
        assert!(decode(b"\x1b[").is_empty());
        assert!(decode(b"\x1b[Z").is_empty());
        assert!(decode(b"\x1bO").is_empty());
        assert!(decode(b"wasd").is_empty());
        assert!(decode(b"").is_empty());
    }

    #[test]
    fn several_sequences_in_one_read() {
        assert_eq!(
            decode(b"\x1b[A\x1b[Dx\x1b[C"),
            vec![Button::UpArrow, Button::LeftArrow, Button::RightArrow]
        );
        assert_eq!(decode(b"\x1b[A\x1b"), vec![Button::UpArrow, Button::Esc]);
    }

    #[test]
    fn sequences_do_not_span_reads() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.decode(b"\x1b"), vec![Button::Esc]);
        assert!(decoder.decode(b"[A").is_empty());
    }

    #[test]
    fn ctrl_c_interrupts() {
        assert_eq!(decode(&[CTRL_C]), vec![Button::Interrupt]);
        assert_eq!(decode(&[ESC, CSI, CTRL_C]), vec![Button::Interrupt]);
        assert!(Button::Interrupt.is_quit());
        assert_eq!(Button::Interrupt.direction(), None);
    }

    #[test]
    fn button_directions() {
        assert_eq!(Button::UpArrow.direction(), Some(Direction::Up));
        assert_eq!(Button::DownArrow.direction(), Some(Direction::Down));
        assert_eq!(Button::LeftArrow.direction(), Some(Direction::Left));
        assert_eq!(Button::RightArrow.direction(), Some(Direction::Right));
    }

    #[test]
    fn reader_forwards_buttons_then_end_of_stream() {
        let (tx, rx) = sync_channel(1);
        let chunks = Chunks(VecDeque::from(vec![b"\x1b[B".to_vec(), b"junk".to_vec(), vec![ESC]]));

        let handle = spawn_reader(chunks, tx).unwrap();

        assert_eq!(rx.recv().unwrap().unwrap(), Button::DownArrow);
        assert_eq!(rx.recv().unwrap().unwrap(), Button::Esc);
        let err = rx.recv().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);

        handle.join().unwrap();
        assert!(rx.recv().is_err());
    }

    #[test]
    fn reader_forwards_read_errors() {
        let (tx, rx) = sync_channel(1);
        let handle = spawn_reader(Broken, tx).unwrap();

        let err = rx.recv().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "device gone");
        handle.join().unwrap();
    }

    #[test]
    fn reader_stops_when_receiver_is_gone() {
        let (tx, rx) = sync_channel(1);
        drop(rx);

        let chunks = Chunks(VecDeque::from(vec![b"\x1b[A".to_vec()]));
        spawn_reader(chunks, tx).unwrap().join().unwrap();
    }
}
