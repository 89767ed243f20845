//! Deferred checks and the aggregator that runs them

use super::message::Message;

/// A deferred, zero-argument validation over one captured value.
///
/// `None` means the check passed.
pub type Check<'a> = Box<dyn Fn() -> Option<Message> + Send + Sync + 'a>;

/// Runs every check once, in order, and collects the failures.
///
/// There is no short-circuit: a failing check never prevents the ones after
/// it from running. Messages come back in check order, unmerged. When all
/// checks pass the result is an empty `Vec`.
pub fn run_validations<'a, I>(checks: I) -> Vec<Message>
where
    I: IntoIterator<Item = Check<'a>>,
{
    checks.into_iter().filter_map(|check| check()).collect()
}

/// A check that always passes.
pub fn pass<'a>() -> Check<'a> {
    Box::new(|| None)
}

/// A check that always fails with `message`.
pub fn fail<'a>(message: Message) -> Check<'a> {
    Box::new(move || Some(message.clone()))
}
