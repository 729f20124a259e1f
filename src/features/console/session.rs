use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{interval_at, Instant};
use uuid::Uuid;

use crate::features::legal_advisor::services::{AnswerError, AnswerResult, AnswerService};
use crate::shared::constants::EMPTY_QUESTION_PROMPT;

const BUSY_MESSAGE: &str = "⚖️ Consulting Indian Law knowledge base...";
const BUSY_TICK: Duration = Duration::from_secs(1);

/// One operator's question-and-answer session
pub struct ConsoleSession {
    answer_service: Arc<AnswerService>,
    identity: String,
}

impl ConsoleSession {
    pub fn new(answer_service: Arc<AnswerService>) -> Self {
        Self {
            answer_service,
            identity: format!("session-{}", Uuid::new_v4()),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Read questions line by line until `/exit`, `/quit` or end of input
    pub async fn run<R, W>(&self, input: R, mut output: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        output
            .write_all(b"Indian Legal Advisor\nAsk about IPC, the IT Act 2000 or cybercrime law. Type /exit to quit.\n\n")
            .await?;

        let mut lines = input.lines();
        loop {
            output.write_all(b"> ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                output.write_all(b"\n").await?;
                break;
            };

            if matches!(line.trim(), "/exit" | "/quit") {
                output.write_all(b"Goodbye!\n").await?;
                break;
            }

            let result = self.ask_with_indicator(&line, &mut output).await?;
            output.write_all(render(&result).as_bytes()).await?;
            output.write_all(b"\n\n").await?;
        }

        output.flush().await
    }

    /// Run one question, printing a dot per second while the agent works
    async fn ask_with_indicator<W>(&self, question: &str, output: &mut W) -> io::Result<AnswerResult>
    where
        W: AsyncWrite + Unpin,
    {
        if question.trim().is_empty() {
            return Ok(self.answer_service.handle(&self.identity, question).await);
        }

        output.write_all(BUSY_MESSAGE.as_bytes()).await?;
        output.flush().await?;

        let answer = self.answer_service.handle(&self.identity, question);
        tokio::pin!(answer);
        let mut ticker = interval_at(Instant::now() + BUSY_TICK, BUSY_TICK);

        let result = loop {
            tokio::select! {
                biased;
                result = &mut answer => break result,
                _ = ticker.tick() => {
                    output.write_all(b".").await?;
                    output.flush().await?;
                }
            }
        };

        output.write_all(b"\n\n").await?;
        Ok(result)
    }
}

/// Text shown to the operator for an answer or failure
pub fn render(result: &AnswerResult) -> String {
    match result {
        Ok(answer) => format!("🧾 Legal Information\n\n{}", answer.text),
        Err(AnswerError::Validation(_)) => format!("⚠️ {}", EMPTY_QUESTION_PROMPT),
        Err(AnswerError::RateLimited { message, .. }) => format!("⏳ {}", message),
        Err(AnswerError::Agent(message)) => format!("❌ Error: {}", message),
    }
}
