// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Naiad CLI entrypoint.
//!
//! Reads one JSON message per line from stdin, handles them in order on the
//! dispatch worker, and writes one JSON response per line to stdout.

use std::collections::BTreeSet;
use std::error::Error;
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

use naiad::dispatch::Dispatcher;
use naiad::model::demo_graph;
use naiad::protocol::{Action, Message, Response};
use naiad::queue::MessageQueue;
use naiad::session::Session;
use naiad::store::{GraphFolder, WriteDurability};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<graph-dir>] [--durable-writes]\n  {program} [--graph <dir>] [--durable-writes]\n  {program} --demo\n\nReads one JSON message per line from stdin and writes one JSON response per line to stdout.\n\nIf graph-dir/--graph is omitted, the current working directory is used.\n--demo uses a built-in demo graph in a temporary directory and cannot be combined with graph-dir/--graph.\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    demo: bool,
    graph_dir: Option<String>,
    durable_writes: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "--graph" => {
                if options.graph_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.graph_dir = Some(dir);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.graph_dir.is_some() {
                    return Err(());
                }
                options.graph_dir = Some(arg);
            }
        }
    }

    if options.demo && options.graph_dir.is_some() {
        return Err(());
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "naiad".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let (folder, graph) = if options.demo {
            let now_millis = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            let demo_dir = std::env::temp_dir()
                .join(format!("naiad-demo-graph-{}-{now_millis}", std::process::id()));
            let folder = if options.durable_writes {
                GraphFolder::new(demo_dir).with_durability(WriteDurability::Durable)
            } else {
                GraphFolder::new(demo_dir)
            };
            let graph = demo_graph();
            folder.save_graph(&graph)?;
            (folder, graph)
        } else {
            let dir = options.graph_dir.unwrap_or_else(|| ".".to_owned());
            let folder = if options.durable_writes {
                GraphFolder::new(dir).with_durability(WriteDurability::Durable)
            } else {
                GraphFolder::new(dir)
            };
            let graph = folder.load_or_init_graph()?;
            (folder, graph)
        };

        let session = Arc::new(Mutex::new(Session::new(graph)));
        let dispatcher = Arc::new(Dispatcher::with_folder(folder.clone()));

        let mut retry_actions = BTreeSet::new();
        retry_actions.insert(Action::Pos);
        let queue = MessageQueue::with_retry_actions(retry_actions);

        let handler_session = session.clone();
        let handler_dispatcher = dispatcher.clone();
        queue.start(
            Arc::new(move |message: &Message| {
                let mut session = handler_session.lock().expect("session lock poisoned");
                handler_dispatcher.dispatch(&mut session, message)
            }),
            Arc::new(|response: Response| {
                print_response(&response);
            }),
        );

        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Message::from_json_str(&line) {
                Ok(message) => queue.enqueue(message),
                // Invalid input answers immediately; it never occupies the queue.
                Err(err) => print_response(&Response::from_protocol_error(err)),
            }
        }

        queue.stop();

        // Every mutation already persisted; one more save catches a graph
        // whose last write failed transiently.
        let session = session.lock().expect("session lock poisoned");
        folder.save_graph(session.graph())?;
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("naiad: {err}");
        std::process::exit(1);
    }
}

fn print_response(response: &Response) {
    match serde_json::to_string(response) {
        Ok(line) => {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{line}");
            let _ = stdout.flush();
        }
        Err(err) => eprintln!("naiad: cannot serialize response: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, CliOptions};

    #[test]
    fn parses_empty_args() {
        let options = parse_options(std::iter::empty()).expect("parse options");
        assert_eq!(options, CliOptions::default());
    }

    #[test]
    fn parses_demo_flag() {
        let options = parse_options(["--demo".to_owned()].into_iter()).expect("parse options");
        assert!(options.demo);
        assert!(options.graph_dir.is_none());
    }

    #[test]
    fn parses_graph_dir_flag() {
        let options = parse_options(["--graph".to_owned(), "some/dir".to_owned()].into_iter())
            .expect("parse options");
        assert_eq!(options.graph_dir.as_deref(), Some("some/dir"));
        assert!(!options.demo);
    }

    #[test]
    fn parses_positional_graph_dir() {
        let options = parse_options(["some/dir".to_owned()].into_iter()).expect("parse options");
        assert_eq!(options.graph_dir.as_deref(), Some("some/dir"));
    }

    #[test]
    fn parses_durable_writes() {
        let options = parse_options(["some/dir".to_owned(), "--durable-writes".to_owned()].into_iter())
            .expect("parse options");
        assert!(options.durable_writes);
        assert_eq!(options.graph_dir.as_deref(), Some("some/dir"));
    }

    #[test]
    fn rejects_demo_with_graph_dir() {
        parse_options(["--demo".to_owned(), "--graph".to_owned(), ".".to_owned()].into_iter())
            .unwrap_err();

        parse_options(["--demo".to_owned(), "some/dir".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_unknown_args() {
        parse_options(["--nope".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_flags() {
        parse_options(["--demo".to_owned(), "--demo".to_owned()].into_iter()).unwrap_err();

        parse_options(
            ["--graph".to_owned(), ".".to_owned(), "--graph".to_owned(), "other".to_owned()]
                .into_iter(),
        )
        .unwrap_err();

        parse_options(
            ["--durable-writes".to_owned(), "--durable-writes".to_owned()].into_iter(),
        )
        .unwrap_err();
    }

    #[test]
    fn rejects_multiple_positional_graph_dirs() {
        parse_options(["one".to_owned(), "two".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_missing_graph_value() {
        parse_options(["--graph".to_owned()].into_iter()).unwrap_err();
    }
}
