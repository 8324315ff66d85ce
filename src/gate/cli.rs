//! CLI gate: lists candidates on stderr and reads a numbered choice.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use super::{DisambiguationGate, DisambiguationRequest};
use crate::contacts::CandidatePerson;
use crate::error::GateError;

/// Terminal gate. End of input means the operator walked away.
pub struct CliGate<R> {
    lines: Mutex<Lines<R>>,
}

impl CliGate<BufReader<Stdin>> {
    /// Read choices from the process's stdin.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> CliGate<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }
}

/// Render the candidate list the way the operator sees it.
pub fn render_candidates(request: &DisambiguationRequest) -> String {
    let mut out = format!(
        "Several people match \"{}\" for {} <{}>:\n",
        request.organization_key, request.contact.name, request.contact.email
    );
    for (i, candidate) in request.candidates.iter().enumerate() {
        out.push_str(&format!("  {}. {}", i + 1, candidate.name));
        if let Some(title) = &candidate.title {
            out.push_str(&format!(" - {title}"));
        }
        if let Some(location) = &candidate.location {
            out.push_str(&format!(" ({location})"));
        }
        out.push('\n');
        if let Some(url) = &candidate.profile_url {
            out.push_str(&format!("     {url}\n"));
        }
    }
    out
}

/// Parse a 1-based choice into a 0-based index.
fn parse_choice(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

#[async_trait]
impl<R> DisambiguationGate for CliGate<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        "cli"
    }

    async fn present(&self, request: DisambiguationRequest) -> Result<CandidatePerson, GateError> {
        let count = request.candidates.len();
        eprintln!("\n{}", render_candidates(&request));

        let mut lines = self.lines.lock().await;
        loop {
            eprint!("Select 1-{count}: ");
            match lines.next_line().await? {
                Some(line) => match parse_choice(&line, count) {
                    Some(index) => return Ok(request.candidates[index].clone()),
                    None => eprintln!("Invalid choice: {}", line.trim()),
                },
                None => return Err(GateError::Abandoned),
            }
        }
    }
}
