//! Interactive guessing session
//!
//! Walks the tree by asking the user each question: "yes" follows the left
//! branch, "no" the right one. A wrong guess at a leaf makes the tree learn
//! the user's answer through a leaf split.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::tree::validate_value;
use crate::domain::{Branch, DecisionTree, DomainError};
use crate::infrastructure::traits::Prompter;

/// How a single round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The leaf reached was the user's answer.
    Guessed { answer: String },
    /// The guess was wrong and the tree grew by one answer.
    Learned { answer: String, question: String },
    /// Input ended before the round finished.
    Abandoned,
}

/// Service driving question/answer rounds over a tree.
pub struct SessionService {
    prompter: Arc<dyn Prompter>,
}

impl SessionService {
    /// Create a new session service.
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self { prompter }
    }

    /// Play rounds until the user declines another one or input ends.
    pub fn play(&self, tree: &mut DecisionTree) -> ApplicationResult<Vec<RoundOutcome>> {
        let mut outcomes = Vec::new();
        loop {
            let outcome = self.play_round(tree)?;
            let abandoned = outcome == RoundOutcome::Abandoned;
            outcomes.push(outcome);
            if abandoned || self.ask_branch("Play again?")? != Some(Branch::Yes) {
                break;
            }
        }
        Ok(outcomes)
    }

    /// Play a single round.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn play_round(&self, tree: &mut DecisionTree) -> ApplicationResult<RoundOutcome> {
        let mut current = tree.root().ok_or(DomainError::EmptyTree)?;

        loop {
            let node = tree.get(current)?;
            if node.is_leaf() {
                break;
            }
            let Some(branch) = self.ask_branch(node.value())? else {
                return Ok(RoundOutcome::Abandoned);
            };
            match node.child(branch) {
                Some(next) => current = next,
                None => {
                    self.say(&format!("I know nothing behind \"{branch}\" here."))?;
                    return Ok(RoundOutcome::Abandoned);
                }
            }
        }

        let guess = tree.value(current)?.to_string();
        match self.ask_branch(&format!("Is it {guess}?"))? {
            None => return Ok(RoundOutcome::Abandoned),
            Some(Branch::Yes) => {
                self.say("Got it!")?;
                return Ok(RoundOutcome::Guessed { answer: guess });
            }
            Some(Branch::No) => {}
        }

        let Some(answer) = self.ask_value("What were you thinking of?")? else {
            return Ok(RoundOutcome::Abandoned);
        };
        let Some(question) = self.ask_value(&format!(
            "Give me a question that is answered \"yes\" for {answer} and \"no\" for {guess}:"
        ))?
        else {
            return Ok(RoundOutcome::Abandoned);
        };

        tree.split_leaf(current, &answer, &question)?;
        debug!("tree grew to {} nodes", tree.len());
        self.say("Thanks, I will remember that.")?;
        Ok(RoundOutcome::Learned { answer, question })
    }

    /// Ask until the reply is yes or no; None on end of input.
    fn ask_branch(&self, question: &str) -> ApplicationResult<Option<Branch>> {
        loop {
            let Some(reply) = self.ask(&format!("{question} [y/n]"))? else {
                return Ok(None);
            };
            match reply.parse::<Branch>() {
                Ok(branch) => return Ok(Some(branch)),
                Err(_) => self.say("Please answer yes or no.")?,
            }
        }
    }

    /// Ask until the reply can be stored in the tree; None on end of input.
    fn ask_value(&self, question: &str) -> ApplicationResult<Option<String>> {
        loop {
            let Some(reply) = self.ask(question)? else {
                return Ok(None);
            };
            match validate_value(&reply) {
                Ok(()) => return Ok(Some(reply)),
                Err(e) => self.say(&format!("Cannot use that: {e}"))?,
            }
        }
    }

    fn ask(&self, question: &str) -> ApplicationResult<Option<String>> {
        self.prompter.ask(question).map_err(prompt_err)
    }

    fn say(&self, message: &str) -> ApplicationResult<()> {
        self.prompter.say(message).map_err(prompt_err)
    }
}

fn prompt_err(e: std::io::Error) -> ApplicationError {
    ApplicationError::OperationFailed {
        context: "interactive prompt".into(),
        source: Box::new(e),
    }
}
