//! A line-oriented terminal shell around a [`Controller`].
//!
//! The shell turns typed commands into controller calls and prints the board
//! after every change. It owns no game state of its own.

use std::{fmt::Write as _, str::FromStr};

use rand::Rng;
use shakmaty::{Chess, Color, File, Position, Rank, Square};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::{
    controller::Controller,
    difficulty::Difficulty,
    oracle::RulesOracle,
    provider::MoveProvider,
    session::{Coord, HumanMove, Lifecycle, Promotion, Side},
};

const HELP: &str = "\
commands:
  start [easy|medium|hard|1|2|3]  start the game
  move <from> <to> [q|r|b|n]      move a piece, e.g. `move e2 e4`; `e2e4` also works
  confirm                         let the AI answer your move
  reset                           start over
  show                            print the board
  help                            this text
  quit                            leave";

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(Option<Difficulty>),
    Move(HumanMove),
    Confirm,
    Reset,
    Show,
    Help,
    Quit,
}

fn parse_square(s: &str) -> Result<Coord, String> {
    Square::from_str(s)
        .map(Coord::from)
        .map_err(|_| format!("not a square: {s}"))
}

/// Parses `e2e4`, `e7e8q` or the two squares as separate words.
fn parse_move<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<HumanMove, String> {
    let first = words.next().ok_or("which move?")?;
    if !first.is_ascii() {
        return Err(format!("not a move: {first}"));
    }
    let (origin, destination, promo) = if first.len() >= 4 {
        let (from, rest) = first.split_at(2);
        let (to, promo) = rest.split_at(2.min(rest.len()));
        (from, to, (!promo.is_empty()).then_some(promo))
    } else {
        let to = words.next().ok_or("move needs a destination square")?;
        (first, to, words.next())
    };

    let mut hm = HumanMove::new(parse_square(origin)?, parse_square(destination)?);
    if let Some(p) = promo {
        let promotion = p
            .chars()
            .next()
            .filter(|_| p.len() == 1)
            .and_then(Promotion::from_char)
            .ok_or_else(|| format!("not a promotion piece: {p}"))?;
        hm = hm.with_promotion(promotion);
    }
    Ok(hm)
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let lower = line.trim().to_ascii_lowercase();
        let mut words = lower.split_whitespace();
        let Some(head) = words.next() else {
            return Err("empty command".to_string());
        };
        match head {
            "start" => words
                .next()
                .map(|d| d.parse::<Difficulty>().map_err(|e| e.to_string()))
                .transpose()
                .map(Command::Start),
            "move" | "m" => parse_move(words).map(Command::Move),
            "confirm" | "c" => Ok(Command::Confirm),
            "reset" => Ok(Command::Reset),
            "show" | "board" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ => parse_move(lower.split_whitespace())
                .map(Command::Move)
                .map_err(|_| format!("unknown command {head:?}, try `help`")),
        }
    }
}

/// Draws the board with `bottom`'s pieces nearest the viewer.
///
/// White pieces are upper case, black lower case, empty squares `.`.
pub fn render_board(position: &Chess, bottom: Color) -> String {
    let board = position.board();
    let mut ranks: Vec<u32> = (0..8).collect();
    let mut files: Vec<u32> = (0..8).collect();
    if bottom == Color::White {
        ranks.reverse();
    } else {
        files.reverse();
    }

    let mut out = String::new();
    for &r in &ranks {
        let _ = write!(out, "{} ", r + 1);
        for &f in &files {
            let sq = Square::from_coords(File::new(f), Rank::new(r));
            let c = board.piece_at(sq).map_or('.', |p| p.char());
            out.push(' ');
            out.push(c);
        }
        out.push('\n');
    }
    out.push_str("  ");
    for &f in &files {
        out.push(' ');
        out.push(File::new(f).char());
    }
    out.push('\n');
    out
}

pub struct Shell<O, P, R> {
    controller: Controller<O, P, R>,
    default_difficulty: Option<Difficulty>,
}

impl<O, P, R> Shell<O, P, R>
where
    O: RulesOracle,
    P: MoveProvider,
    R: Rng + Send,
{
    pub fn new(controller: Controller<O, P, R>) -> Self {
        Shell {
            controller,
            default_difficulty: None,
        }
    }

    /// Difficulty used by a bare `start`, instead of asking.
    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.default_difficulty = difficulty;
        self
    }

    pub fn controller(&self) -> &Controller<O, P, R> {
        &self.controller
    }

    fn view(&self) -> String {
        let session = self.controller.session();
        let snap = session.snapshot();
        let human = session.color_of(Side::Human);
        let mut out = String::new();
        let _ = writeln!(out, "AI ({})", color_name(!human));
        out.push_str(&render_board(session.position(), human));
        let _ = writeln!(out, "Player ({})", color_name(human));
        let status = match snap.lifecycle {
            Lifecycle::NotStarted => "Type `start` to begin".to_string(),
            Lifecycle::AwaitingHumanMove => "Player's turn".to_string(),
            Lifecycle::AwaitingConfirmation => "AI's turn (type `confirm`)".to_string(),
            Lifecycle::AwaitingAutomatedMove => "AI's turn".to_string(),
            Lifecycle::Finished => match snap.result {
                Some(result) => format!("Game over: {result}"),
                None => "Game over".to_string(),
            },
        };
        let _ = writeln!(out, "{status}");
        if let Some(fault) = snap.fault {
            let _ = writeln!(out, "error: {fault} (type `reset`)");
        }
        out
    }

    /// Reads commands until `quit` or end of input.
    pub async fn run<I, W>(&mut self, input: I, out: &mut W) -> io::Result<()>
    where
        I: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        out.write_all(self.view().as_bytes()).await?;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            debug!(line, "command");
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(why) => {
                    out.write_all(format!("{why}\n").as_bytes()).await?;
                    continue;
                }
            };

            let reply = match command {
                Command::Quit => break,
                Command::Help => Ok(format!("{HELP}\n")),
                Command::Show => Ok(self.view()),
                Command::Reset => {
                    self.controller.reset();
                    Ok(format!("Game reset.\n{}", self.view()))
                }
                Command::Start(difficulty) => {
                    let difficulty = match difficulty.or(self.default_difficulty) {
                        Some(d) => d,
                        None => {
                            out.write_all(
                                b"Select AI difficulty (1 - Easy, 2 - Medium, 3 - Hard): ",
                            )
                            .await?;
                            out.flush().await?;
                            let Some(answer) = lines.next_line().await? else {
                                break;
                            };
                            match answer.parse() {
                                Ok(d) => d,
                                Err(e) => {
                                    out.write_all(format!("{e}\n").as_bytes()).await?;
                                    continue;
                                }
                            }
                        }
                    };
                    self.controller.start(difficulty).await.map(|()| self.view())
                }
                Command::Move(hm) => self.controller.submit_move(hm).map(|()| self.view()),
                Command::Confirm => self.controller.confirm().await.map(|()| self.view()),
            };

            match reply {
                Ok(text) => out.write_all(text.as_bytes()).await?,
                Err(err) if err.is_fatal() => {
                    out.write_all(format!("fatal: {err}\n").as_bytes()).await?
                }
                Err(err) => out.write_all(format!("{err}\n").as_bytes()).await?,
            }

            // A finished game is announced once and then put away.
            if self.controller.session().lifecycle() == Lifecycle::Finished {
                self.controller.reset();
                out.write_all(format!("Game reset.\n{}", self.view()).as_bytes())
                    .await?;
            }
            out.flush().await?;
        }
        out.flush().await
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::{oracle::StandardRules, provider::ScriptedProvider};

    fn c(s: &str) -> Coord {
        parse_square(s).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!("start".parse::<Command>(), Ok(Command::Start(None)));
        assert_eq!(
            "start 2".parse::<Command>(),
            Ok(Command::Start(Some(Difficulty::Medium)))
        );
        assert_eq!(
            "move e2 e4".parse::<Command>(),
            Ok(Command::Move(HumanMove::new(c("e2"), c("e4"))))
        );
        assert_eq!(
            "E7E8N".parse::<Command>(),
            Ok(Command::Move(
                HumanMove::new(c("e7"), c("e8")).with_promotion(Promotion::Knight)
            ))
        );
        assert_eq!("confirm".parse::<Command>(), Ok(Command::Confirm));
        assert!("start 7".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("move e2".parse::<Command>().is_err());
    }

    #[test]
    fn non_ascii_input_is_an_error() {
        assert!("aé34".parse::<Command>().is_err());
        assert!("move aé34".parse::<Command>().is_err());
        assert!("é2 e4".parse::<Command>().is_err());
    }

    #[test]
    fn board_faces_the_human() {
        let white_view = render_board(&Chess::default(), Color::White);
        let lines: Vec<_> = white_view.lines().collect();
        assert_eq!(lines[0], "8  r n b q k b n r");
        assert_eq!(lines[7], "1  R N B Q K B N R");
        assert_eq!(lines[8], "   a b c d e f g h");

        let black_view = render_board(&Chess::default(), Color::Black);
        let lines: Vec<_> = black_view.lines().collect();
        assert_eq!(lines[0], "1  R N B K Q B N R");
        assert_eq!(lines[8], "   h g f e d c b a");
    }

    #[tokio::test]
    async fn plays_a_scripted_exchange() {
        let controller = Controller::new(
            StandardRules,
            ScriptedProvider::parse(["e7e5"]).unwrap(),
            StepRng::new(0, 0),
        );
        let mut shell = Shell::new(controller);
        let input: &[u8] = b"confirm\nstart\n1\ne2e4\nconfirm\nshow\nquit\nshow\n";
        let mut out = Vec::new();
        shell.run(input, &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("the game has not been started"));
        assert!(out.contains("Select AI difficulty"));
        assert!(out.contains("AI's turn (type `confirm`)"));
        assert!(out.contains("5  . . . . p . . ."));
        assert_eq!(shell.controller().session().lifecycle(), Lifecycle::AwaitingHumanMove);
        assert_eq!(shell.controller().provider().calls(), 1);
    }

    #[tokio::test]
    async fn finished_games_reset_themselves() {
        let controller = Controller::new(
            StandardRules,
            ScriptedProvider::parse(["e7e5", "d8h4"]).unwrap(),
            StepRng::new(0, 0),
        );
        let mut shell = Shell::new(controller).with_difficulty(Some(Difficulty::Easy));
        let input: &[u8] = b"start\nf2f3\nconfirm\ng2g4\nconfirm\n";
        let mut out = Vec::new();
        shell.run(input, &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Game over: AI wins!"));
        assert!(out.contains("Game reset."));
        assert_eq!(shell.controller().session().lifecycle(), Lifecycle::NotStarted);
    }

    #[tokio::test]
    async fn runs_against_process_stdout() {
        let controller =
            Controller::new(StandardRules, ScriptedProvider::default(), StepRng::new(0, 0));
        let mut shell = Shell::new(controller);
        let input: &[u8] = b"help\nquit\n";
        shell.run(input, &mut tokio::io::stdout()).await.unwrap();
        assert_eq!(shell.controller().session().lifecycle(), Lifecycle::NotStarted);
    }
}
