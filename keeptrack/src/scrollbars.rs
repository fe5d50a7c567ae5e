// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scrollbar thickness published on the document root.

use alloc::string::String;

use crate::host::{Dom, Priority};
use crate::scroll_padding::format_px;

/// Width variable.
pub const SCROLLBAR_WIDTH: &str = "--scrollbar-width";

/// Height variable.
pub const SCROLLBAR_HEIGHT: &str = "--scrollbar-height";

/// Memo of the last published scrollbar sizes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scrollbars {
    width: Option<String>,
    height: Option<String>,
}

impl Scrollbars {
    /// Creates an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the enabled sizes that changed.
    ///
    /// Thickness is the difference between the viewport size and the root's
    /// client size.
    pub fn update<H: Dom>(&mut self, host: &mut H, width: bool, height: bool) {
        let inner = host.inner_size();
        let client = host.client_size();
        if width {
            publish(host, &mut self.width, SCROLLBAR_WIDTH, inner.width - client.width);
        }
        if height {
            publish(host, &mut self.height, SCROLLBAR_HEIGHT, inner.height - client.height);
        }
    }

    /// Removes whichever variables were published and forgets them.
    pub fn clear<H: Dom>(&mut self, host: &mut H) {
        let root = host.document_element();
        if self.width.take().is_some() {
            host.remove_style_property(root, SCROLLBAR_WIDTH);
        }
        if self.height.take().is_some() {
            host.remove_style_property(root, SCROLLBAR_HEIGHT);
        }
    }
}

fn publish<H: Dom>(host: &mut H, last: &mut Option<String>, name: &str, px: f64) {
    let value = format_px(px);
    if last.as_deref() == Some(value.as_str()) {
        return;
    }
    let root = host.document_element();
    host.set_style_property(root, name, &value, Priority::Normal);
    *last = Some(value);
}
