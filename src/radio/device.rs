//! 无线设备
//!
//! 每个节点恰好挂接一个无线设备到共享信道上。

use super::capture::CaptureSink;
use crate::net::{DeviceId, NodeId};

/// 无线设备：节点在共享介质上的收发端。
pub struct RadioDevice {
    id: DeviceId,
    owner: NodeId,
    capture: Option<Box<dyn CaptureSink>>,
}

impl RadioDevice {
    pub(crate) fn new(id: DeviceId, owner: NodeId) -> Self {
        Self {
            id,
            owner,
            capture: None,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub(crate) fn set_capture(&mut self, sink: Box<dyn CaptureSink>) {
        self.capture = Some(sink);
    }

    pub(crate) fn capture_mut(&mut self) -> Option<&mut (dyn CaptureSink + 'static)> {
        self.capture.as_deref_mut()
    }
}
