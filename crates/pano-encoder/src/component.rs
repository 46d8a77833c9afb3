//! Compression component lifecycle
//!
//! The hardware component moves through a fixed sequence of states:
//!
//! ```text
//! start:     Loaded → Idle → enable input/output ports → Executing
//! teardown:  Executing → Idle → disable input/output ports → Loaded
//! ```
//!
//! Buffers may only be exchanged while Executing. Every other call order is
//! rejected with [`EncoderError::InvalidTransition`] or
//! [`EncoderError::PortState`].

use tracing::debug;

use crate::error::{EncoderError, Result};

/// Component state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentState {
    /// Configured but holding no buffers
    #[default]
    Loaded,
    /// Ports may be enabled or disabled
    Idle,
    /// Accepting and producing buffers
    Executing,
}

/// Component port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// Raw frames in
    Input,
    /// Compressed segments out
    Output,
}

/// Lifecycle tracker shared by all compression engines
#[derive(Debug, Default)]
pub struct Component {
    state: ComponentState,
    input_enabled: bool,
    output_enabled: bool,
}

impl Component {
    /// A component in the Loaded state with both ports disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// Whether `port` has its buffers enabled
    pub fn is_port_enabled(&self, port: Port) -> bool {
        match port {
            Port::Input => self.input_enabled,
            Port::Output => self.output_enabled,
        }
    }

    /// Move to Idle, from Loaded or Executing
    pub fn enter_idle(&mut self) -> Result<()> {
        match self.state {
            ComponentState::Loaded | ComponentState::Executing => self.transition(ComponentState::Idle),
            ComponentState::Idle => Err(self.invalid("enter Idle")),
        }
    }

    /// Move Idle → Executing; both ports must be enabled
    pub fn enter_executing(&mut self) -> Result<()> {
        if self.state != ComponentState::Idle || !self.input_enabled || !self.output_enabled {
            return Err(self.invalid("enter Executing"));
        }
        self.transition(ComponentState::Executing)
    }

    /// Move Idle → Loaded; both ports must be disabled
    pub fn enter_loaded(&mut self) -> Result<()> {
        if self.state != ComponentState::Idle || self.input_enabled || self.output_enabled {
            return Err(self.invalid("enter Loaded"));
        }
        self.transition(ComponentState::Loaded)
    }

    /// Enable buffers on `port` (Idle only)
    pub fn enable_port(&mut self, port: Port) -> Result<()> {
        self.set_port(port, true)
    }

    /// Disable buffers on `port` (Idle only)
    pub fn disable_port(&mut self, port: Port) -> Result<()> {
        self.set_port(port, false)
    }

    /// Fail unless Executing
    pub fn ensure_executing(&self, operation: &'static str) -> Result<()> {
        if self.state == ComponentState::Executing {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn set_port(&mut self, port: Port, enable: bool) -> Result<()> {
        if self.state != ComponentState::Idle {
            return Err(self.invalid(if enable { "enable port" } else { "disable port" }));
        }
        let slot = match port {
            Port::Input => &mut self.input_enabled,
            Port::Output => &mut self.output_enabled,
        };
        if *slot == enable {
            return Err(EncoderError::PortState { port, enabled: enable });
        }
        *slot = enable;
        debug!("{:?} port {}", port, if enable { "enabled" } else { "disabled" });
        Ok(())
    }

    fn transition(&mut self, to: ComponentState) -> Result<()> {
        debug!("Component {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }

    fn invalid(&self, operation: &'static str) -> EncoderError {
        EncoderError::InvalidTransition {
            from: self.state,
            operation,
        }
    }
}
