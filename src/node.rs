//! The callback side of the node: receives wire images,
//! runs the converter and hands results to a publisher.
//!
//! Nothing here knows about a concrete transport; the
//! [`bridge`][crate::bridge] module wires a node to a
//! rosbridge JSON stream.
use std::sync::Arc;

use serde_derive::*;
use tracing::{debug, error, info};

use crate::{convert::ThermalImageConverter, frame::ImageMessage};

pub const NODE_NAME: &str = "thermal_image_processor";
pub const INPUT_TOPIC: &str = "/flir_one_node/ir_16b/image_raw";
pub const OUTPUT_TOPIC: &str = "/flir_one_node/ir_rgb/image_raw";
pub const IMAGE_TYPE: &str = "sensor_msgs/Image";
pub const QUEUE_SIZE: usize = 10;

/// Sink for converted frames.
pub trait Publish {
    fn publish(&self, msg: ImageMessage);

    /// Whether published frames can still reach anyone.
    fn is_closed(&self) -> bool {
        false
    }
}

impl<P: Publish + ?Sized> Publish for Arc<P> {
    fn publish(&self, msg: ImageMessage) {
        (**self).publish(msg)
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<P: Publish + ?Sized> Publish for &P {
    fn publish(&self, msg: ImageMessage) {
        (**self).publish(msg)
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Names the node is bound to.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub name: String,
    pub input_topic: String,
    pub output_topic: String,
    pub queue_size: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            name: NODE_NAME.into(),
            input_topic: INPUT_TOPIC.into(),
            output_topic: OUTPUT_TOPIC.into(),
            queue_size: QUEUE_SIZE,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub received: u64,
    pub published: u64,
    pub dropped: u64,
}

pub struct ThermalImageNode<P> {
    converter: ThermalImageConverter,
    publisher: P,
    stats: NodeStats,
}

impl<P: Publish> ThermalImageNode<P> {
    pub fn new(publisher: P) -> Self {
        Self::with_converter(ThermalImageConverter::default(), publisher)
    }

    pub fn with_converter(converter: ThermalImageConverter, publisher: P) -> Self {
        ThermalImageNode {
            converter,
            publisher,
            stats: NodeStats::default(),
        }
    }

    /// Handle one incoming frame. A frame that fails to
    /// convert is logged and dropped; returns whether a frame
    /// was published.
    pub fn on_message(&mut self, msg: &ImageMessage) -> bool {
        self.stats.received += 1;
        match self.converter.convert_message(msg) {
            Ok(out) => {
                debug!(
                    seq = out.header.seq,
                    frame_id = %out.header.frame_id,
                    width = out.width,
                    height = out.height,
                    "publishing color frame"
                );
                self.publisher.publish(out);
                self.stats.published += 1;
                true
            }
            Err(e) => {
                error!(
                    seq = msg.header.seq,
                    frame_id = %msg.header.frame_id,
                    encoding = %msg.encoding,
                    "Error processing thermal image: {}",
                    e
                );
                self.stats.dropped += 1;
                false
            }
        }
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Log a summary and hand back the publisher.
    pub fn shutdown(self) -> P {
        info!(
            received = self.stats.received,
            published = self.stats.published,
            dropped = self.stats.dropped,
            "node shutting down"
        );
        self.publisher
    }
}
