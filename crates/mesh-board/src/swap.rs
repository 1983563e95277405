//! Swap target correction
//!
//! A request triggered from inside a component's shadow tree must replace the
//! component itself: the default target (the trigger's light-DOM scope) is
//! invisible to the host library.

use mesh_dom::{DomTree, NodeId};

/// How a response replaces its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapStyle {
    /// Replace the target's children
    #[default]
    InnerHtml,
    /// Replace the target element itself
    OuterHtml,
}

impl SwapStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStyle::InnerHtml => "innerHTML",
            SwapStyle::OuterHtml => "outerHTML",
        }
    }
}

/// Pending swap, handed to the before-swap hook for correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapDecision {
    pub triggering_element: NodeId,
    pub target: NodeId,
    pub swap_style: SwapStyle,
}

/// Before-swap hook redirecting shadow-scoped swaps to the shadow host
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapInterceptor;

impl SwapInterceptor {
    pub fn new() -> Self {
        Self
    }

    /// Correct `decision` in place. Returns true when it was redirected.
    pub fn before_swap(&self, tree: &DomTree, decision: &mut SwapDecision) -> bool {
        let scope = tree.root_node(decision.triggering_element);
        let Some(host) = tree.shadow_host(scope) else {
            return false;
        };
        tracing::debug!(
            "Redirecting {} swap from {} to shadow host {}",
            decision.swap_style.as_str(),
            decision.target,
            host
        );
        decision.target = host;
        decision.swap_style = SwapStyle::OuterHtml;
        true
    }
}
