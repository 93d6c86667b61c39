//! Line-oriented annotation front end.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use crate::app::{AnnotatorApp, AppError, Step};
use crate::model::{BoxKind, Rectangle};
use crate::session::Direction;

const HELP: &str = "\
Commands:
  next | n                   move to the next crop
  prev | p                   move to the previous crop
  show | s                   list the boxes of the current crop
  add X1 Y1 X2 Y2 LABEL      add a manual box
  del-manual N               delete manual box N
  del-existing N             delete existing box N
  export PATH                write all visited boxes as CSV
  save                       save the session
  labels                     list the accepted labels
  quit | q                   save and exit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Move(Direction),
    Show,
    Add { rectangle: Rectangle, label: String },
    Delete(BoxKind, usize),
    Export(PathBuf),
    Save,
    Labels,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".to_string());
    };
    let rest: Vec<&str> = words.collect();

    let index = |rest: &[&str]| -> Result<usize, String> {
        match rest {
            [n] => n.parse().map_err(|_| format!("not a box number: {n}")),
            _ => Err(format!("usage: {head} N")),
        }
    };

    match head {
        "next" | "n" => Ok(Command::Move(Direction::Next)),
        "prev" | "p" => Ok(Command::Move(Direction::Previous)),
        "show" | "s" => Ok(Command::Show),
        "add" | "a" => {
            if rest.len() < 5 {
                return Err("usage: add X1 Y1 X2 Y2 LABEL".to_string());
            }
            let mut coords = [0i32; 4];
            for (slot, word) in coords.iter_mut().zip(&rest[..4]) {
                *slot = word
                    .parse()
                    .map_err(|_| format!("not a coordinate: {word}"))?;
            }
            let [ax, ay, bx, by] = coords;
            // Corners may come in any order, like a drag gesture
            let rectangle = Rectangle::from_corners(ax, ay, bx, by)
                .unwrap_or(Rectangle::new(ax, ay, bx, by));
            Ok(Command::Add {
                rectangle,
                label: rest[4..].join(" "),
            })
        }
        "del-manual" | "dm" => Ok(Command::Delete(BoxKind::Manual, index(&rest)?)),
        "del-existing" | "de" => Ok(Command::Delete(BoxKind::Existing, index(&rest)?)),
        "export" => match rest.as_slice() {
            [path] => Ok(Command::Export(PathBuf::from(path))),
            _ => Err("usage: export PATH".to_string()),
        },
        "save" => Ok(Command::Save),
        "labels" => Ok(Command::Labels),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

fn show<W: Write>(app: &AnnotatorApp, out: &mut W) -> std::io::Result<()> {
    let session = app.session();
    let navigation = session.navigation();
    writeln!(out, "{}", session.position())?;
    writeln!(
        out,
        "  next: {}  previous: {}",
        if navigation.can_go_next { "yes" } else { "no" },
        if navigation.can_go_previous { "yes" } else { "no" }
    )?;

    let boxes = session.current_boxes();
    for (kind, title) in [(BoxKind::Existing, "Existing"), (BoxKind::Manual, "Manual")] {
        writeln!(out, "  {title} boxes:")?;
        for (index, labeled) in boxes.get(kind).iter().enumerate() {
            writeln!(out, "    {index}: {labeled}")?;
        }
    }
    Ok(())
}

/// Drive `app` from `input` until quit, end of input, or end of data.
/// The session is closed and saved on the way out.
pub fn run<R: BufRead, W: Write>(app: &mut AnnotatorApp, input: R, mut out: W) -> Result<()> {
    writeln!(out, "Type 'help' for commands.")?;
    show(app, &mut out)?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };

        let result = match command {
            Command::Move(direction) => match app.step(direction) {
                Ok(Step::Moved(_)) => {
                    show(app, &mut out)?;
                    Ok(())
                }
                Ok(Step::EndOfData(direction)) => {
                    writeln!(out, "No more crops in {direction} direction.")?;
                    if direction == Direction::Next {
                        break;
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Command::Show => {
                show(app, &mut out)?;
                Ok(())
            }
            Command::Add { rectangle, label } => app.add_box(rectangle, &label),
            Command::Delete(BoxKind::Manual, index) => app.delete_manual_box(index).map(drop),
            Command::Delete(BoxKind::Existing, index) => {
                app.delete_existing_box(index).map(drop)
            }
            Command::Export(path) => match app.export(&path) {
                Ok(rows) => {
                    writeln!(out, "Exported {rows} boxes to {}", path.display())?;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Command::Save => app.save(),
            Command::Labels => {
                writeln!(out, "{}", app.config().vocabulary.join(", "))?;
                Ok(())
            }
            Command::Help => {
                writeln!(out, "{HELP}")?;
                Ok(())
            }
            Command::Quit => break,
        };

        // Rejected edits are reported and the session carries on
        if let Err(e) = result {
            match e {
                AppError::Session(_) | AppError::UnknownLabel(_) | AppError::Export(_) => {
                    writeln!(out, "{e}")?;
                }
                other => return Err(other.into()),
            }
        }
    }

    app.close()?;
    writeln!(out, "Session saved.")?;
    Ok(())
}
