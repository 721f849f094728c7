use anyhow::Result;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use egui_phosphor::regular;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{BodyRegion, DashboardPlugin, HeaderRegion, TabHandle, make_header, make_tab};
use crate::stream::EventStream;
use crate::utils::{current_timestamp, truncate_string};

#[derive(Debug, Clone, PartialEq)]
pub struct InspectedEvent {
    pub received_at: String,
    pub event_name: String,
    pub request_id: String,
    /// 原始消息，不做修改
    pub payload: Value,
}

impl InspectedEvent {
    fn from_payload(payload: Value) -> Self {
        let event_name = payload
            .get("event_name")
            .or_else(|| payload.get("method"))
            .map(display_value)
            .unwrap_or_else(|| "-".to_string());
        let request_id = payload
            .get("request_id")
            .or_else(|| payload.pointer("/params/requestId"))
            .map(display_value)
            .unwrap_or_else(|| "-".to_string());

        Self {
            received_at: current_timestamp(),
            event_name,
            request_id,
            payload,
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

type EventBuffer = Rc<RefCell<VecDeque<InspectedEvent>>>;

/// 流量检查：激活时订阅事件推送，离开 tab 即取消订阅
pub struct InspectTrafficPlugin {
    stream: Rc<dyn EventStream>,
    events: EventBuffer,
    capacity: usize,
    subscribed: bool,
}

impl InspectTrafficPlugin {
    pub fn new(stream: Rc<dyn EventStream>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            stream,
            events: Rc::new(RefCell::new(VecDeque::with_capacity(capacity))),
            capacity,
            subscribed: false,
        }
    }

    #[cfg(test)]
    fn events(&self) -> Vec<InspectedEvent> {
        self.events.borrow().iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.events.borrow_mut().clear();
    }
}

impl DashboardPlugin for InspectTrafficPlugin {
    fn name(&self) -> &str {
        "inspect_traffic"
    }

    fn title(&self) -> &str {
        "Inspect Traffic"
    }

    fn initialize_tab(&self) -> TabHandle {
        make_tab(self.name(), "Inspect Traffic", regular::BINOCULARS)
    }

    fn initialize_header(&self) -> HeaderRegion {
        make_header(self.title())
    }

    fn initialize_body(&self) -> BodyRegion {
        BodyRegion::for_plugin(self.name())
    }

    fn activated(&mut self) -> Result<()> {
        let events = Rc::clone(&self.events);
        let capacity = self.capacity;
        self.stream.enable(Box::new(move |payload| {
            let mut events = events.borrow_mut();
            while events.len() >= capacity {
                events.pop_front();
            }
            events.push_back(InspectedEvent::from_payload(payload));
        }));
        self.subscribed = true;
        crate::app_log!(info, "Inspect", "traffic inspection enabled");
        Ok(())
    }

    fn deactivated(&mut self) -> Result<()> {
        if self.subscribed {
            self.stream.disable();
            self.subscribed = false;
            crate::app_log!(info, "Inspect", "traffic inspection disabled");
        }
        Ok(())
    }

    fn show_body(&mut self, ui: &mut egui::Ui) {
        let mut clear = false;
        ui.horizontal(|ui| {
            ui.label(format!("{} events", self.events.borrow().len()));
            if ui
                .button(egui::RichText::new(format!("{} Clear", regular::TRASH)))
                .clicked()
            {
                clear = true;
            }
        });
        if clear {
            self.clear();
        }

        ui.separator();

        let events = self.events.borrow();
        TableBuilder::new(ui)
            .striped(true)
            .stick_to_bottom(true)
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(140.0))
            .column(Column::auto().at_least(120.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Time");
                });
                header.col(|ui| {
                    ui.strong("Event");
                });
                header.col(|ui| {
                    ui.strong("Request");
                });
                header.col(|ui| {
                    ui.strong("Payload");
                });
            })
            .body(|body| {
                body.rows(18.0, events.len(), |mut row| {
                    let event = &events[row.index()];
                    row.col(|ui| {
                        ui.monospace(&event.received_at);
                    });
                    row.col(|ui| {
                        ui.label(&event.event_name);
                    });
                    row.col(|ui| {
                        ui.monospace(truncate_string(&event.request_id, 16));
                    });
                    row.col(|ui| {
                        ui.monospace(truncate_string(&event.payload.to_string(), 120));
                    });
                });
            });
    }
}
