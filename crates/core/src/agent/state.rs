use vision_buddy_model::{AssistantMessage, ToolCallRequest};

use super::TurnFinish;

/// Where a turn is in its model/tool loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum LoopState {
    AwaitingModel,
    AwaitingTools {
        requests: Vec<ToolCallRequest>,
        // Set when this is the last round-trip the turn is allowed. The
        // tools still run so every request gets its result.
        limit_reached: bool,
    },
    Done(TurnFinish),
}

impl LoopState {
    /// Decides what follows the `round_trips`-th model response.
    pub(super) fn after_response(
        msg: &AssistantMessage,
        round_trips: usize,
        max_round_trips: usize,
    ) -> Self {
        if !msg.has_tool_calls() {
            return LoopState::Done(TurnFinish::Answered);
        }
        LoopState::AwaitingTools {
            requests: msg.tool_calls.clone(),
            limit_reached: round_trips >= max_round_trips,
        }
    }

    /// Decides what follows a dispatched batch of tool calls.
    #[inline]
    pub(super) fn after_tools(limit_reached: bool) -> Self {
        if limit_reached {
            LoopState::Done(TurnFinish::RoundTripLimitReached)
        } else {
            LoopState::AwaitingModel
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn lookup() -> AssistantMessage {
        AssistantMessage {
            content: String::new(),
            tool_calls: vec![ToolCallRequest::new(
                "call_1",
                "today_tool",
                json!({}),
            )],
        }
    }

    #[test]
    fn test_transitions() {
        let answer = AssistantMessage {
            content: "Hello!".to_owned(),
            tool_calls: vec![],
        };
        assert_eq!(
            LoopState::after_response(&answer, 8, 8),
            LoopState::Done(TurnFinish::Answered)
        );

        let LoopState::AwaitingTools {
            requests,
            limit_reached,
        } = LoopState::after_response(&lookup(), 1, 8)
        else {
            panic!("expected tool calls");
        };
        assert_eq!(requests.len(), 1);
        assert!(!limit_reached);
        assert_eq!(LoopState::after_tools(false), LoopState::AwaitingModel);
    }

    #[test]
    fn test_round_trip_limit() {
        assert!(matches!(
            LoopState::after_response(&lookup(), 3, 3),
            LoopState::AwaitingTools {
                limit_reached: true,
                ..
            }
        ));
        assert_eq!(
            LoopState::after_tools(true),
            LoopState::Done(TurnFinish::RoundTripLimitReached)
        );
    }
}
