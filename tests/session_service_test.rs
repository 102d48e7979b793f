//! Tests for SessionService
//!
//! A scripted prompter replays user replies and records everything asked
//! and said, so whole rounds can be checked without a terminal.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use guesstree::application::services::{RoundOutcome, SessionService};
use guesstree::application::ApplicationError;
use guesstree::domain::{parse, DecisionTree, DomainError, Order};
use guesstree::infrastructure::traits::Prompter;

const ANIMALS: &str = "{ is_it_alive? { is_it_a_plant? { tree } { flower } } { cat } }";

#[derive(Default)]
struct ScriptedPrompter {
    replies: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
    said: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Default::default()
        })
    }

    fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    fn said(&self) -> Vec<String> {
        self.said.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str) -> io::Result<Option<String>> {
        self.asked.lock().unwrap().push(question.to_string());
        Ok(self.replies.lock().unwrap().pop_front())
    }

    fn say(&self, message: &str) -> io::Result<()> {
        self.said.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

struct BrokenPrompter;

impl Prompter for BrokenPrompter {
    fn ask(&self, _question: &str) -> io::Result<Option<String>> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
    }

    fn say(&self, _message: &str) -> io::Result<()> {
        Ok(())
    }
}

fn animals() -> DecisionTree {
    parse(ANIMALS).unwrap().into_tree()
}

// ============================================================
// play_round()
// ============================================================

#[test]
fn given_correct_guess_when_playing_round_then_guessed() {
    let prompter = ScriptedPrompter::new(&["y", "n", "yes"]);
    let service = SessionService::new(prompter.clone());
    let mut tree = animals();

    let outcome = service.play_round(&mut tree).unwrap();

    assert_eq!(
        outcome,
        RoundOutcome::Guessed {
            answer: "flower".into()
        }
    );
    assert_eq!(
        prompter.asked(),
        [
            "is_it_alive? [y/n]",
            "is_it_a_plant? [y/n]",
            "Is it flower? [y/n]"
        ]
    );
    assert_eq!(tree.len(), 5);
}

#[test]
fn given_wrong_guess_when_playing_round_then_tree_learns_answer() {
    let prompter = ScriptedPrompter::new(&["no", "n", "dog", "does_it_bark?"]);
    let service = SessionService::new(prompter.clone());
    let mut tree = animals();

    let outcome = service.play_round(&mut tree).unwrap();

    assert_eq!(
        outcome,
        RoundOutcome::Learned {
            answer: "dog".into(),
            question: "does_it_bark?".into()
        }
    );
    assert_eq!(tree.len(), 7);
    let pre: Vec<_> = tree.values(Order::Pre).collect();
    assert_eq!(
        pre,
        ["is_it_alive?", "is_it_a_plant?", "tree", "flower", "does_it_bark?", "dog", "cat"]
    );
    assert!(prompter.asked()[3].contains("\"yes\" for dog and \"no\" for cat"));
}

#[test]
fn given_unclear_reply_when_asking_then_asks_again() {
    let prompter = ScriptedPrompter::new(&["maybe", "n", "y"]);
    let service = SessionService::new(prompter.clone());
    let mut tree = animals();

    let outcome = service.play_round(&mut tree).unwrap();

    assert_eq!(outcome, RoundOutcome::Guessed { answer: "cat".into() });
    assert_eq!(prompter.asked()[0], prompter.asked()[1]);
    assert!(prompter.said().contains(&"Please answer yes or no.".to_string()));
}

#[test]
fn given_unstorable_answer_when_learning_then_asks_again() {
    let prompter = ScriptedPrompter::new(&["n", "n", "{dog}", "dog", "does_it_bark?"]);
    let service = SessionService::new(prompter.clone());
    let mut tree = animals();

    let outcome = service.play_round(&mut tree).unwrap();

    assert!(matches!(outcome, RoundOutcome::Learned { .. }));
    assert!(prompter.said().iter().any(|m| m.starts_with("Cannot use that")));
    assert_eq!(tree.leaf_values(), ["tree", "flower", "dog", "cat"]);
}

#[test]
fn given_input_ends_mid_round_when_playing_then_abandoned_and_unchanged() {
    let prompter = ScriptedPrompter::new(&["n", "n", "dog"]);
    let service = SessionService::new(prompter);
    let mut tree = animals();

    let outcome = service.play_round(&mut tree).unwrap();

    assert_eq!(outcome, RoundOutcome::Abandoned);
    assert_eq!(tree.len(), 5);
}

#[test]
fn given_empty_tree_when_playing_round_then_empty_tree_error() {
    let service = SessionService::new(ScriptedPrompter::new(&[]));
    let mut tree = DecisionTree::new();

    let err = service.play_round(&mut tree).unwrap_err();

    assert!(matches!(err, ApplicationError::Domain(DomainError::EmptyTree)));
}

#[test]
fn given_failing_prompter_when_playing_round_then_operation_failed() {
    let service = SessionService::new(Arc::new(BrokenPrompter));
    let mut tree = animals();

    let err = service.play_round(&mut tree).unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
}

// ============================================================
// play()
// ============================================================

#[test]
fn given_two_rounds_when_playing_then_second_round_uses_learned_answer() {
    let prompter = ScriptedPrompter::new(&[
        // round 1: learn dog
        "n", "n", "dog", "does_it_bark?", "y",
        // round 2: reach dog through the new question
        "n", "y", "y", "n",
    ]);
    let service = SessionService::new(prompter);
    let mut tree = animals();

    let outcomes = service.play(&mut tree).unwrap();

    assert_eq!(
        outcomes,
        [
            RoundOutcome::Learned {
                answer: "dog".into(),
                question: "does_it_bark?".into()
            },
            RoundOutcome::Guessed { answer: "dog".into() },
        ]
    );
}

#[test]
fn given_input_ends_when_playing_then_stops_after_abandoned_round() {
    let prompter = ScriptedPrompter::new(&["y"]);
    let service = SessionService::new(prompter);
    let mut tree = animals();

    let outcomes = service.play(&mut tree).unwrap();

    assert_eq!(outcomes, [RoundOutcome::Abandoned]);
}
