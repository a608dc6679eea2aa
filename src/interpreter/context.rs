use super::SystemContext;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::time::Duration;

pub struct StdioContext;

impl SystemContext for StdioContext {
    fn writeln(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_line(&mut self, prompt: &str) -> Option<String> {
        let mut stdout = std::io::stdout().lock();
        if !prompt.is_empty() {
            let _ = write!(stdout, "{prompt}");
        }
        let _ = stdout.flush();
        drop(stdout);

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        }
    }

    fn clear(&mut self) {
        print!("\x1Bc");
        let _ = std::io::stdout().flush();
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Captures output in memory and serves input from a queue of lines.
#[derive(Debug, Default)]
pub struct BufferedContext {
    buffer: String,
    input: VecDeque<String>,
}

impl BufferedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buffer: String::new(),
            input: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn into_data(self) -> String {
        self.buffer
    }
}

impl SystemContext for BufferedContext {
    fn writeln(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.input.pop_front()
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn sleep(&mut self, _duration: Duration) {}
}
