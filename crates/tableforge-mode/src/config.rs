//! Configurable mode settings and their form rendering.
//!
//! A mode's configuration factory returns a [`ConfigForm`]: the settings
//! data plus a list of declared form entries. Each room owns one form.
//!
//! ```text
//! factory() → ConfigForm ──render(owner)──→ [Item with ids]  ──patch──→ apply()
//!                        └─render(viewer)─→ [Item, no ids]
//! ```
//!
//! Only the most recent owner render can be patched. Ids come from a
//! per-form counter, so ids from an older render never match again.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tableforge_protocol::{CheckItem, ConfigPatch, Item, ItemKind, Range};
use tableforge_runtime::ConfigData;
use tracing::trace;

/// Called with `(data, group label, option label, checked)`.
pub type CheckboxCallback = Arc<dyn Fn(&ConfigData, &str, &str, bool) + Send + Sync>;

/// Called with `(data, group label, newly checked option label)`.
pub type RadioCallback = Arc<dyn Fn(&ConfigData, &str, &str) + Send + Sync>;

/// Called with `(data, range label, new value)`.
pub type RangeCallback = Arc<dyn Fn(&ConfigData, &str, i64) + Send + Sync>;

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// One option of a [`CheckboxGroup`].
#[derive(Clone)]
pub struct CheckOption {
    label: String,
    tips: String,
    checked: bool,
    on_change: Option<CheckboxCallback>,
}

impl CheckOption {
    /// An option with an empty label is never rendered.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tips: String::new(),
            checked: false,
            on_change: None,
        }
    }

    pub fn tips(mut self, tips: impl Into<String>) -> Self {
        self.tips = tips.into();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn on_change(
        mut self,
        f: impl Fn(&ConfigData, &str, &str, bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }
}

/// A group of independent on/off options.
#[derive(Clone)]
pub struct CheckboxGroup {
    label: String,
    tips: String,
    options: Vec<CheckOption>,
}

impl CheckboxGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tips: String::new(),
            options: Vec::new(),
        }
    }

    pub fn tips(mut self, tips: impl Into<String>) -> Self {
        self.tips = tips.into();
        self
    }

    pub fn option(mut self, option: CheckOption) -> Self {
        self.options.push(option);
        self
    }

    /// Removes the first option labelled `label`.
    pub fn remove_option(mut self, label: &str) -> Self {
        if let Some(pos) = self.options.iter().position(|o| o.label == label) {
            self.options.remove(pos);
        }
        self
    }

    /// Drops every option declared so far.
    pub fn reset_options(mut self) -> Self {
        self.options.clear();
        self
    }
}

#[derive(Clone)]
struct RadioOption {
    label: String,
    tips: String,
}

/// A group of mutually exclusive options. At most one is checked.
#[derive(Clone)]
pub struct RadioGroup {
    label: String,
    tips: String,
    options: Vec<RadioOption>,
    checked: Option<usize>,
    on_checked: Option<RadioCallback>,
}

impl RadioGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tips: String::new(),
            options: Vec::new(),
            checked: None,
            on_checked: None,
        }
    }

    pub fn tips(mut self, tips: impl Into<String>) -> Self {
        self.tips = tips.into();
        self
    }

    pub fn option(mut self, label: impl Into<String>, tips: impl Into<String>) -> Self {
        self.options.push(RadioOption {
            label: label.into(),
            tips: tips.into(),
        });
        self
    }

    /// Checks the first option labelled `label`, unchecking the rest.
    /// An unknown label leaves nothing checked.
    pub fn check(mut self, label: &str) -> Self {
        self.checked = self.options.iter().position(|o| o.label == label);
        self
    }

    /// Removes the first option labelled `label`. Removing the checked
    /// option leaves nothing checked.
    pub fn remove_option(mut self, label: &str) -> Self {
        let Some(pos) = self.options.iter().position(|o| o.label == label) else {
            return self;
        };
        self.options.remove(pos);
        self.checked = match self.checked {
            Some(i) if i == pos => None,
            Some(i) if i > pos => Some(i - 1),
            other => other,
        };
        self
    }

    /// Drops every option declared so far, and the check with them.
    pub fn reset_options(mut self) -> Self {
        self.options.clear();
        self.checked = None;
        self
    }

    pub fn on_checked(mut self, f: impl Fn(&ConfigData, &str, &str) + Send + Sync + 'static) -> Self {
        self.on_checked = Some(Arc::new(f));
        self
    }

    /// Label of the checked option.
    pub fn checked_label(&self) -> Option<&str> {
        self.checked
            .and_then(|i| self.options.get(i))
            .map(|o| o.label.as_str())
    }
}

/// A bounded integer setting.
#[derive(Clone)]
pub struct RangeField {
    label: String,
    tips: String,
    min: i64,
    max: i64,
    value: i64,
    min_label: String,
    max_label: String,
    value_labels: BTreeMap<i64, String>,
    on_change: Option<RangeCallback>,
}

impl RangeField {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tips: String::new(),
            min: 0,
            max: 0,
            value: 0,
            min_label: String::new(),
            max_label: String::new(),
            value_labels: BTreeMap::new(),
            on_change: None,
        }
    }

    pub fn tips(mut self, tips: impl Into<String>) -> Self {
        self.tips = tips.into();
        self
    }

    pub fn min(mut self, value: i64, label: impl Into<String>) -> Self {
        self.min = value;
        self.min_label = label.into();
        self
    }

    pub fn max(mut self, value: i64, label: impl Into<String>) -> Self {
        self.max = value;
        self.max_label = label.into();
        self
    }

    pub fn value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    pub fn value_label(mut self, value: i64, label: impl Into<String>) -> Self {
        self.value_labels.insert(value, label.into());
        self
    }

    pub fn remove_value_label(mut self, value: i64) -> Self {
        self.value_labels.remove(&value);
        self
    }

    pub fn on_change(mut self, f: impl Fn(&ConfigData, &str, i64) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn current(&self) -> i64 {
        self.value
    }
}

#[derive(Clone)]
enum Entry {
    Desc(String),
    Checkbox(CheckboxGroup),
    Radio(RadioGroup),
    Range(RangeField),
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Issues ids during an owner render; issues nothing when readonly.
struct Ids<'a> {
    counter: Option<&'a mut u64>,
}

impl Ids<'_> {
    fn next(&mut self) -> Option<String> {
        let counter = self.counter.as_deref_mut()?;
        *counter += 1;
        Some(counter.to_string())
    }
}

/// An addressable item from the last owner render.
#[derive(Debug, Clone)]
struct Issued {
    entry: usize,
    id: String,
    /// `(option id, index into the entry's declared options)`.
    options: Vec<(String, usize)>,
}

impl Entry {
    /// Renders the entry, or `None` if there is nothing to show.
    ///
    /// Option ids are issued before the id of their group.
    fn render(&self, ids: &mut Ids<'_>) -> Option<(Item, Vec<(String, usize)>)> {
        match self {
            Entry::Desc(text) => {
                if text.is_empty() {
                    return None;
                }
                let item = blank_item(ids.next(), ItemKind::Desc, text, "");
                Some((item, Vec::new()))
            }
            Entry::Checkbox(group) => {
                if group.label.is_empty() {
                    return None;
                }
                let mut mapping = Vec::new();
                let mut checkboxes = Vec::new();
                for (index, option) in group.options.iter().enumerate() {
                    if option.label.is_empty() {
                        continue;
                    }
                    let id = ids.next();
                    if let Some(id) = &id {
                        mapping.push((id.clone(), index));
                    }
                    checkboxes.push(CheckItem {
                        id,
                        label: option.label.clone(),
                        tips: option.tips.clone(),
                        checked: option.checked,
                    });
                }
                if checkboxes.is_empty() {
                    return None;
                }
                let mut item = blank_item(ids.next(), ItemKind::Checkbox, &group.label, &group.tips);
                item.checkboxes = checkboxes;
                Some((item, mapping))
            }
            Entry::Radio(group) => {
                if group.label.is_empty() {
                    return None;
                }
                let mut mapping = Vec::new();
                let mut radios = Vec::new();
                for (index, option) in group.options.iter().enumerate() {
                    if option.label.is_empty() {
                        continue;
                    }
                    let id = ids.next();
                    if let Some(id) = &id {
                        mapping.push((id.clone(), index));
                    }
                    radios.push(CheckItem {
                        id,
                        label: option.label.clone(),
                        tips: option.tips.clone(),
                        checked: group.checked == Some(index),
                    });
                }
                if radios.is_empty() {
                    return None;
                }
                let mut item = blank_item(ids.next(), ItemKind::Radio, &group.label, &group.tips);
                item.radios = radios;
                Some((item, mapping))
            }
            Entry::Range(field) => {
                if field.label.is_empty() {
                    return None;
                }
                let mut item = blank_item(ids.next(), ItemKind::Range, &field.label, &field.tips);
                item.range = Some(Range {
                    min: field.min,
                    max: field.max,
                    value: field.value,
                    min_label: field.min_label.clone(),
                    max_label: field.max_label.clone(),
                    value_labels: field.value_labels.clone(),
                });
                Some((item, Vec::new()))
            }
        }
    }

    /// Applies the patch entries addressed at this item. Returns how many
    /// values changed.
    fn apply(&mut self, data: &ConfigData, issued: &Issued, patch: &ConfigPatch) -> usize {
        match self {
            Entry::Desc(_) => 0,
            Entry::Checkbox(group) => {
                let mut changed = 0;
                for (option_id, index) in &issued.options {
                    let key = format!("{}.{}", issued.id, option_id);
                    let Some(checked) = patch.bool(&key) else {
                        continue;
                    };
                    let Some(option) = group.options.get_mut(*index) else {
                        continue;
                    };
                    if option.checked == checked {
                        continue;
                    }
                    option.checked = checked;
                    changed += 1;
                    if let Some(cb) = &option.on_change {
                        cb(data, &group.label, &option.label, checked);
                    }
                }
                changed
            }
            Entry::Radio(group) => {
                for (option_id, index) in &issued.options {
                    let key = format!("{}.{}", issued.id, option_id);
                    if patch.bool(&key) != Some(true) {
                        continue;
                    }
                    if group.checked == Some(*index) {
                        return 0;
                    }
                    group.checked = Some(*index);
                    if let (Some(cb), Some(option)) = (&group.on_checked, group.options.get(*index)) {
                        cb(data, &group.label, &option.label);
                    }
                    return 1;
                }
                0
            }
            Entry::Range(field) => {
                let Some(value) = patch.int(&issued.id) else {
                    return 0;
                };
                if value < field.min || value > field.max || value == field.value {
                    return 0;
                }
                field.value = value;
                if let Some(cb) = &field.on_change {
                    cb(data, &field.label, value);
                }
                1
            }
        }
    }
}

fn blank_item(id: Option<String>, kind: ItemKind, label: &str, tips: &str) -> Item {
    Item {
        id,
        kind,
        label: label.to_string(),
        tips: tips.to_string(),
        checkboxes: Vec::new(),
        radios: Vec::new(),
        range: None,
    }
}

// ---------------------------------------------------------------------------
// ConfigForm
// ---------------------------------------------------------------------------

/// A mode's settings: the data rule code reads, plus the declared form.
pub struct ConfigForm {
    data: ConfigData,
    entries: Vec<Entry>,
    next_id: u64,
    issued: Vec<Issued>,
}

impl ConfigForm {
    pub fn new(data: ConfigData) -> Self {
        Self {
            data,
            entries: Vec::new(),
            next_id: 0,
            issued: Vec::new(),
        }
    }

    /// A form with no settings at all.
    pub fn empty() -> Self {
        Self::new(ConfigData::empty())
    }

    /// The settings data. Form callbacks write into it; the running game
    /// reads it.
    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    /// Adds a description line. Empty text is not rendered.
    pub fn desc(mut self, text: impl Into<String>) -> Self {
        self.entries.push(Entry::Desc(text.into()));
        self
    }

    pub fn checkbox(mut self, group: CheckboxGroup) -> Self {
        self.entries.push(Entry::Checkbox(group));
        self
    }

    pub fn radio(mut self, group: RadioGroup) -> Self {
        self.entries.push(Entry::Radio(group));
        self
    }

    pub fn range(mut self, field: RangeField) -> Self {
        self.entries.push(Entry::Range(field));
        self
    }

    /// Renders the form.
    ///
    /// An owner render (`readonly == false`) issues fresh ids and becomes
    /// the target of later [`apply`](Self::apply) calls. A readonly render
    /// carries no ids and leaves the update target alone.
    pub fn render(&mut self, readonly: bool) -> Vec<Item> {
        let mut counter = self.next_id;
        let mut ids = Ids {
            counter: (!readonly).then_some(&mut counter),
        };
        let mut items = Vec::with_capacity(self.entries.len());
        let mut issued = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let Some((item, options)) = entry.render(&mut ids) else {
                continue;
            };
            if let Some(id) = &item.id {
                issued.push(Issued {
                    entry: index,
                    id: id.clone(),
                    options,
                });
            }
            items.push(item);
        }
        if !readonly {
            self.next_id = counter;
            self.issued = issued;
        }
        items
    }

    /// Applies `patch` against the ids of the last owner render.
    ///
    /// Unknown keys, wrongly typed values, and out-of-range numbers are
    /// ignored. Change callbacks fire only for values that actually
    /// changed. Returns the number of changed values.
    pub fn apply(&mut self, patch: &ConfigPatch) -> usize {
        let mut changed = 0;
        for issued in &self.issued {
            if let Some(entry) = self.entries.get_mut(issued.entry) {
                changed += entry.apply(&self.data, issued, patch);
            }
        }
        trace!(keys = patch.0.len(), changed, "config patch applied");
        changed
    }

    /// Whether an owner render exists that updates can target.
    pub fn is_addressable(&self) -> bool {
        !self.issued.is_empty()
    }
}

impl Default for ConfigForm {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ConfigForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigForm")
            .field("entries", &self.entries.len())
            .field("next_id", &self.next_id)
            .field("addressable", &self.is_addressable())
            .finish()
    }
}
