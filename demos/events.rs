// SPDX-License-Identifier: MIT
//
// Live event viewer.
//
// Draws a header and a scrolling log of every event the session delivers.
// Press keys, click, resize the terminal. Ctrl-Q quits, Ctrl-T toggles
// mouse reporting, Ctrl-A toggles alt mode.
//
// Usage:
//   cargo run --example events
//   CELLBOX_LOG=/tmp/cellbox.log cargo run --example events

use std::collections::VecDeque;
use std::fs::File;
use std::sync::Mutex;
use std::time::Duration;

use cellbox::{Attribute, Event, InputMode, Key, Session, Size, Style};

const MAX_LOG_ENTRIES: usize = 200;
const TICK: Duration = Duration::from_millis(500);

struct Viewer {
    log: VecDeque<String>,
    events: u64,
    ticks: u64,
}

impl Viewer {
    fn push(&mut self, line: String) {
        if self.log.len() == MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    fn draw(&self, session: &mut Session, mode: InputMode) {
        let Size { cols, rows } = session.size();
        session.clear(Attribute::DEFAULT, Attribute::DEFAULT);

        let header = format!(
            " cellbox events  {} received  mode {:?}  tick {} ",
            self.events, mode, self.ticks
        );
        let header_fg = Attribute::WHITE | Style::BOLD;
        for x in 0..cols {
            session.set_cell(x, 0, ' ', header_fg, Attribute::BLUE);
        }
        put_str(session, 0, 0, &header, header_fg, Attribute::BLUE);

        let visible = usize::from(rows.saturating_sub(1));
        let skip = self.log.len().saturating_sub(visible);
        for (row, line) in (1..rows).zip(self.log.iter().skip(skip)) {
            put_str(session, 1, row, line, Attribute::DEFAULT, Attribute::DEFAULT);
        }
    }
}

fn put_str(session: &mut Session, x: u16, y: u16, text: &str, fg: Attribute, bg: Attribute) {
    let mut col = x;
    for ch in text.chars() {
        session.set_cell(col, y, ch, fg, bg);
        col = col.saturating_add(cellbox::Cell::new(ch).width());
    }
}

fn describe(event: &Event) -> String {
    match event {
        Event::Key(key) if key.modifiers.is_empty() => format!("key   {}", key.key),
        Event::Key(key) => format!("key   {} {:?}", key.key, key.modifiers),
        Event::Mouse(m) => format!("mouse {:?} at {},{} {:?}", m.button, m.x, m.y, m.modifiers),
        Event::Resize(size) => format!("resize {}x{}", size.cols, size.rows),
        Event::Error(err) => format!("error {err}"),
        Event::Interrupt => "interrupt".to_owned(),
        Event::None => "none".to_owned(),
    }
}

fn init_logging() {
    let Ok(path) = std::env::var("CELLBOX_LOG") else {
        return;
    };
    if let Ok(file) = File::create(path) {
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }
}

fn main() -> cellbox::Result<()> {
    init_logging();

    let mut session = Session::init()?;
    let mut viewer = Viewer {
        log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
        events: 0,
        ticks: 0,
    };

    loop {
        let mode = session.set_input_mode(InputMode::empty());
        viewer.draw(&mut session, mode);
        session.render()?;

        let event = session.poll_event_timeout(TICK);
        match event {
            Event::None => {
                viewer.ticks += 1;
                continue;
            }
            Event::Key(key) if key.key == Key::ctrl(b'q') => break,
            Event::Key(key) if key.key == Key::ctrl(b't') => {
                session.set_input_mode(mode ^ InputMode::MOUSE);
            }
            Event::Key(key) if key.key == Key::ctrl(b'a') => {
                let next = if mode.contains(InputMode::ALT) {
                    InputMode::ESC
                } else {
                    InputMode::ALT
                };
                session.set_input_mode(next | (mode & InputMode::MOUSE));
            }
            Event::Error(_) => {
                viewer.push(describe(&event));
                break;
            }
            _ => {}
        }
        viewer.events += 1;
        viewer.push(describe(&event));
    }

    session.shutdown()
}
