//! Interactive Q&A loop.
//!
//! The whole loop shares one session, so a concept question can build on the
//! news summarized just before it.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::NewsPipeline;
use crate::store::{open_sessions, open_store};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// What the user typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Clear,
    Question(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        ChatInput::Empty
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        ChatInput::Exit
    } else if line.eq_ignore_ascii_case("clear") {
        ChatInput::Clear
    } else {
        ChatInput::Question(line)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = open_store(&settings)?;
    let pipeline = NewsPipeline::from_settings(&settings, store, open_sessions(&settings)?)?;
    let session = uuid::Uuid::new_v4().to_string();

    println!("\n{}", style("Newsdesk Chat").bold().cyan());
    println!(
        "{}\n",
        style("질문을 입력하세요. 'exit'로 종료, 'clear'로 대화 맥락을 초기화합니다.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("질문:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("종료합니다.");
                break;
            }
            ChatInput::Clear => {
                match pipeline.reset_session(&session).await {
                    Ok(()) => Output::info("대화 맥락을 초기화했습니다."),
                    Err(e) => Output::error(&format!("Failed to reset session: {}", e)),
                }
            }
            ChatInput::Question(question) => {
                let answer = pipeline.ask(&session, question).await;
                println!("\n{} {}\n", style("답변:").cyan().bold(), answer.text);
            }
        }
    }

    Ok(())
}
