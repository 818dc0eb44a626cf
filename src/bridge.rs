//! rosbridge-protocol transport for the node.
//!
//! The node talks JSON ops over a byte stream (typically a
//! websocket piped through stdin/stdout). On startup it
//! advertises the output topic and subscribes to the input
//! topic; afterwards every `publish` op on the input topic is
//! converted and answered with a `publish` op on the output
//! topic. Replies are written by a separate thread fed from a
//! bounded [`OutboundQueue`]. If that writer fails, the node
//! stops reading input and `serve` returns the write error.
use std::{
    io::{Read, Write},
    thread,
};

use anyhow::{anyhow, Context, Result};
use serde_derive::*;
use serde_json::{Deserializer, Value};
use tracing::{debug, info, warn};

use crate::{
    frame::ImageMessage,
    node::{NodeConfig, NodeStats, Publish, ThermalImageNode, IMAGE_TYPE},
    queue::OutboundQueue,
};

/// The subset of rosbridge ops the node speaks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeOp {
    Publish {
        topic: String,
        msg: Value,
    },
    Subscribe {
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        queue_length: Option<usize>,
    },
    Advertise {
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        queue_size: Option<usize>,
    },
    #[serde(other)]
    Unknown,
}

impl BridgeOp {
    pub fn topic(&self) -> Option<&str> {
        match self {
            BridgeOp::Publish { topic, .. }
            | BridgeOp::Subscribe { topic, .. }
            | BridgeOp::Advertise { topic, .. } => Some(topic),
            BridgeOp::Unknown => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BridgeOp::Publish { .. } => "publish",
            BridgeOp::Subscribe { .. } => "subscribe",
            BridgeOp::Advertise { .. } => "advertise",
            BridgeOp::Unknown => "unknown",
        }
    }
}

fn write_op<W: Write>(writer: &mut W, op: &BridgeOp) -> Result<()> {
    serde_json::to_writer(&mut *writer, op)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Run the node over a rosbridge stream until `reader` is
/// exhausted. Returns the node's counters and the writer.
pub fn serve<R, W>(reader: R, mut writer: W, config: &NodeConfig) -> Result<(NodeStats, W)>
where
    R: Read,
    W: Write + Send + 'static,
{
    write_op(
        &mut writer,
        &BridgeOp::Advertise {
            topic: config.output_topic.clone(),
            msg_type: IMAGE_TYPE.into(),
            queue_size: Some(config.queue_size),
        },
    )
    .context("advertising output topic")?;
    write_op(
        &mut writer,
        &BridgeOp::Subscribe {
            topic: config.input_topic.clone(),
            msg_type: IMAGE_TYPE.into(),
            queue_length: None,
        },
    )
    .context("subscribing to input topic")?;
    info!(
        node = %config.name,
        input = %config.input_topic,
        output = %config.output_topic,
        "node started"
    );

    let (queue, outbound) = OutboundQueue::<ImageMessage>::bounded(config.queue_size);
    let output_topic = config.output_topic.clone();
    let handle = thread::Builder::new()
        .name("bridge-writer".into())
        .spawn(move || -> Result<W> {
            // Dropping `outbound` on error closes the queue.
            for msg in outbound {
                let op = BridgeOp::Publish {
                    topic: output_topic.clone(),
                    msg: serde_json::to_value(msg)?,
                };
                write_op(&mut writer, &op).context("writing published frame")?;
            }
            Ok(writer)
        })?;

    let mut node = ThermalImageNode::new(queue);
    let pumped = pump(reader, &mut node, config);
    let stats = node.stats();
    let queue = node.shutdown();
    let dropped = queue.dropped();
    // Ends the writer once it has drained the queue.
    drop(queue);

    let written = handle
        .join()
        .map_err(|_| anyhow!("bridge writer thread panicked"))?;
    pumped?;
    let writer = written?;
    if dropped > 0 {
        warn!(dropped, "frames lost to queue overflow");
    }
    Ok((stats, writer))
}

fn pump<R: Read, P: Publish>(
    reader: R,
    node: &mut ThermalImageNode<P>,
    config: &NodeConfig,
) -> Result<()> {
    for value in Deserializer::from_reader(reader).into_iter::<Value>() {
        let value = value.context("reading rosbridge stream")?;
        let op = match serde_json::from_value::<BridgeOp>(value) {
            Ok(op) => op,
            Err(e) => {
                warn!("skipping malformed op: {}", e);
                continue;
            }
        };

        match op {
            BridgeOp::Publish { topic, msg } if topic == config.input_topic => {
                match serde_json::from_value::<ImageMessage>(msg) {
                    Ok(image) => {
                        node.on_message(&image);
                    }
                    Err(e) => warn!(topic = %topic, "skipping undecodable image: {}", e),
                }
                if node.publisher().is_closed() {
                    warn!("output closed, no longer reading input");
                    break;
                }
            }
            other => debug!(
                op = other.name(),
                topic = other.topic().unwrap_or(""),
                "ignoring op"
            ),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        colormap::JET,
        frame::{Header, Time, BGR8},
        node::{INPUT_TOPIC, OUTPUT_TOPIC, QUEUE_SIZE},
    };
    use serde_json::json;

    fn publish_line(topic: &str, seq: u32, samples: &[u16], width: u32) -> String {
        let msg = ImageMessage {
            header: Header {
                seq,
                stamp: Time {
                    secs: 1_600_000_000 + seq,
                    nsecs: 250_000_000,
                },
                frame_id: "flir_one".into(),
            },
            height: samples.len() as u32 / width,
            width,
            encoding: "mono16".into(),
            is_bigendian: 0,
            step: width * 2,
            data: samples.iter().flat_map(|s| s.to_le_bytes().to_vec()).collect(),
        };
        serde_json::to_string(&BridgeOp::Publish {
            topic: topic.into(),
            msg: serde_json::to_value(msg).unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn op_wire_format() -> Result<()> {
        let op = BridgeOp::Advertise {
            topic: OUTPUT_TOPIC.into(),
            msg_type: IMAGE_TYPE.into(),
            queue_size: Some(10),
        };
        assert_eq!(
            serde_json::to_value(&op)?,
            json!({
                "op": "advertise",
                "topic": OUTPUT_TOPIC,
                "type": "sensor_msgs/Image",
                "queue_size": 10
            })
        );

        let status: BridgeOp =
            serde_json::from_value(json!({"op": "status", "level": "error", "msg": "x"}))?;
        assert_eq!(status, BridgeOp::Unknown);
        Ok(())
    }

    #[test]
    fn serves_frames_in_order() -> Result<()> {
        let mut bad = publish_line(INPUT_TOPIC, 3, &[1, 2], 2);
        bad = bad.replace("\"height\":1", "\"height\":2");
        let input = [
            publish_line(INPUT_TOPIC, 1, &[0, 1000, 2000, 4000], 2),
            publish_line("/other/topic", 2, &[1, 2], 2),
            r#"{"op": "status", "level": "info", "msg": "hello"}"#.to_string(),
            bad,
            r#"{"op": "publish", "topic": "/flir_one_node/ir_16b/image_raw", "msg": {}}"#
                .to_string(),
            publish_line(INPUT_TOPIC, 4, &[9, 9, 9], 3),
        ]
        .join("\n");

        let (stats, out) = serve(input.as_bytes(), Vec::new(), &NodeConfig::default())?;
        assert_eq!(
            stats,
            NodeStats {
                received: 3,
                published: 2,
                dropped: 1,
            }
        );

        let ops: Vec<BridgeOp> = String::from_utf8(out)?
            .lines()
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>()?;
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0].name(), "advertise");
        assert_eq!(ops[0].topic(), Some(OUTPUT_TOPIC));
        assert_eq!(ops[1].name(), "subscribe");
        assert_eq!(ops[1].topic(), Some(INPUT_TOPIC));

        let images: Vec<ImageMessage> = ops[2..]
            .iter()
            .map(|op| match op {
                BridgeOp::Publish { topic, msg } => {
                    assert_eq!(topic, OUTPUT_TOPIC);
                    Ok(serde_json::from_value(msg.clone())?)
                }
                other => Err(anyhow!("unexpected op {:?}", other)),
            })
            .collect::<Result<_>>()?;

        assert_eq!(images[0].header.seq, 1);
        assert_eq!(images[0].header.stamp.secs, 1_600_000_001);
        assert_eq!(images[0].encoding, BGR8);
        assert_eq!(&images[0].data[9..], &JET.entry(255));
        assert_eq!(images[1].header.seq, 4);
        assert_eq!((images[1].width, images[1].height), (3, 1));
        Ok(())
    }

    /// Accepts `lines` newline-terminated writes, then fails.
    #[derive(Debug)]
    struct BrokenPipe {
        lines: usize,
    }

    impl Write for BrokenPipe {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.lines == 0 {
                return Err(std::io::ErrorKind::BrokenPipe.into());
            }
            if buf.ends_with(b"\n") {
                self.lines -= 1;
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn frames(count: u32) -> String {
        (1..=count)
            .map(|seq| publish_line(INPUT_TOPIC, seq, &[0, 10, 20, 30], 2))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn stops_reading_once_output_is_closed() -> Result<()> {
        let (queue, outbound) = OutboundQueue::<ImageMessage>::bounded(QUEUE_SIZE);
        drop(outbound);
        let mut node = ThermalImageNode::new(queue);
        let input = frames(20);
        pump(input.as_bytes(), &mut node, &NodeConfig::default())?;
        assert_eq!(node.stats().received, 1);
        Ok(())
    }

    #[test]
    fn write_failure_is_returned() {
        let err = serve(
            frames(20).as_bytes(),
            BrokenPipe { lines: 2 },
            &NodeConfig::default(),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("writing published frame"));
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let input = format!(
            "{}\n{{\"op\": \"publish\", \"topic\"",
            publish_line(INPUT_TOPIC, 1, &[0, 1], 2)
        );
        assert!(serve(input.as_bytes(), Vec::new(), &NodeConfig::default()).is_err());
    }
}
