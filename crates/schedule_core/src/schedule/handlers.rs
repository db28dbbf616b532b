//! Keyword handlers: how each SCHEDULE keyword changes a snapshot.

use std::collections::BTreeSet;

use crate::action::MatchingEntities;
use crate::error::{ErrorGuard, ParseContext, ScheduleError};
use crate::keyword::DeckKeyword;
use crate::matcher::{WListManager, WListOp};
use crate::types::ReportStep;
use crate::udq::{UdaControl, UdaValue};

use super::events::ScheduleEvent;
use super::state::ScheduleState;
use super::well::{Group, Well, WellProduction, WellStatus};

/// What applying keywords changed, for the simulator to pick up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatorUpdate {
    pub affected_wells: BTreeSet<String>,
    /// Wells whose productivity index was set by `WELPI`, in canonical order.
    pub welpi_wells: Vec<String>,
    pub well_structure_changed: bool,
}

pub(crate) struct HandlerContext<'a> {
    pub keyword: &'a DeckKeyword,
    pub report_step: ReportStep,
    /// Wells matched by the action whose block is being applied; `?` well
    /// names resolve to these.
    pub matches: Option<&'a MatchingEntities>,
    pub parse_context: &'a ParseContext,
    pub guard: &'a mut ErrorGuard,
    pub update: &'a mut SimulatorUpdate,
}

impl HandlerContext<'_> {
    fn invalid(&self, value: &str) -> ScheduleError {
        ScheduleError::InvalidItem {
            keyword: self.keyword.name.clone(),
            value: value.to_string(),
            location: self.keyword.location.clone(),
        }
    }

    /// Wells named by `pattern`, in canonical order.
    fn wells(&self, state: &ScheduleState, pattern: &str) -> Vec<String> {
        let matcher = state.well_matcher();
        if pattern == "?" {
            let mut wells = matcher.sort(self.matches.map(MatchingEntities::wells).unwrap_or_default());
            wells.dedup();
            return wells;
        }
        matcher.wells_matching(pattern)
    }
}

/// Apply one keyword to `state`. Keywords without a handler are ignored.
pub(crate) fn handle_keyword(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    match ctx.keyword.name.as_str() {
        "WELSPECS" => handle_welspecs(state, ctx),
        "WELOPEN" => handle_welopen(state, ctx),
        "WCONPROD" => handle_wconprod(state, ctx),
        "WELPI" => handle_welpi(state, ctx),
        "WLIST" => handle_wlist(state, ctx),
        "GRUPTREE" => handle_gruptree(state, ctx),
        "WELSEGS" => handle_welsegs(state, ctx),
        "UDQ" => handle_udq(state, ctx),
        other => {
            tracing::debug!(keyword = %other, step = ctx.report_step, "keyword has no schedule handler");
            Ok(())
        }
    }
}

fn ensure_group(state: &mut ScheduleState, name: &str, parent: &str) {
    if state.groups().contains_key(name) {
        return;
    }
    let insert_index = state.groups().len();
    state.groups_mut().insert(
        name.to_string(),
        Group {
            name: name.to_string(),
            parent: Some(parent.to_string()),
            insert_index,
        },
    );
}

fn handle_welspecs(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    let keyword = ctx.keyword;
    for record in &keyword.records {
        let name = keyword.required_item(record, 0)?;
        let group = keyword.required_item(record, 1)?.to_string();
        let head_i: Option<usize> = keyword.parse_item(record, 2)?;
        let head_j: Option<usize> = keyword.parse_item(record, 3)?;
        let ref_depth: Option<f64> = keyword.parse_item(record, 4)?;
        let phase = keyword.item(record, 5).map(str::to_string);

        ensure_group(state, &group, "FIELD");
        if !state.wells().contains_key(name) {
            let insert_index = state.well_order().len();
            state.well_order_mut().add(name);
            state
                .wells_mut()
                .insert(name.to_string(), Well::new(name, group.clone(), insert_index));
            state.events.add(ScheduleEvent::NewWell);
            state.wellgroup_events.add(name, ScheduleEvent::NewWell);
            ctx.update.well_structure_changed = true;
        }

        if let Some(well) = state.wells_mut().get_mut(name) {
            well.group = group;
            well.head = (head_i.unwrap_or(well.head.0), head_j.unwrap_or(well.head.1));
            well.ref_depth = ref_depth.or(well.ref_depth);
            if let Some(phase) = phase {
                well.phase = phase;
            }
        }
        ctx.update.affected_wells.insert(name.to_string());
    }
    Ok(())
}

fn handle_welopen(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    let keyword = ctx.keyword;
    for record in &keyword.records {
        let pattern = keyword.required_item(record, 0)?;
        let status = match keyword.item(record, 1) {
            None => WellStatus::Open,
            Some(raw) => raw.parse::<WellStatus>().map_err(|raw| ctx.invalid(&raw))?,
        };
        for name in ctx.wells(state, pattern) {
            let Some(well) = state.wells_mut().get_mut(&name) else {
                continue;
            };
            if well.status == status {
                continue;
            }
            well.status = status;
            state.events.add(ScheduleEvent::WellStatusChange);
            state.wellgroup_events.add(&name, ScheduleEvent::WellStatusChange);
            ctx.update.affected_wells.insert(name);
        }
    }
    Ok(())
}

fn handle_wconprod(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    let keyword = ctx.keyword;
    for record in &keyword.records {
        let pattern = keyword.required_item(record, 0)?;
        let status = keyword
            .item(record, 1)
            .map(str::parse::<WellStatus>)
            .transpose()
            .map_err(|raw| ctx.invalid(&raw))?;
        let mode = keyword.item(record, 2).unwrap_or("ORAT").to_string();

        let mut limits = Vec::new();
        for (offset, item) in WellProduction::LIMIT_ITEMS.iter().enumerate() {
            let Some(control) = UdaControl::wconprod(item) else {
                continue;
            };
            let value = keyword
                .item(record, 3 + offset)
                .map_or_else(UdaValue::default, UdaValue::from_item);
            limits.push((control, value));
        }

        for name in ctx.wells(state, pattern) {
            for (control, value) in &limits {
                state.update_uda(value, &name, *control)?;
            }
            let Some(well) = state.wells_mut().get_mut(&name) else {
                continue;
            };
            if let Some(status) = status {
                well.status = status;
            }
            well.production = Some(WellProduction {
                mode: mode.clone(),
                limits: limits.clone(),
            });
            state.events.add(ScheduleEvent::ProductionUpdate);
            state.wellgroup_events.add(&name, ScheduleEvent::ProductionUpdate);
            ctx.update.affected_wells.insert(name);
        }
    }
    Ok(())
}

fn handle_welpi(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    let keyword = ctx.keyword;
    for record in &keyword.records {
        let pattern = keyword.required_item(record, 0)?;
        let raw = keyword.required_item(record, 1)?;
        let value = raw.parse::<f64>().map_err(|_| ctx.invalid(raw))?;

        for name in ctx.wells(state, pattern) {
            let Some(well) = state.wells_mut().get_mut(&name) else {
                continue;
            };
            well.productivity_index = Some(value);
            state.events.add(ScheduleEvent::WellProductivityIndex);
            state.wellgroup_events.add(&name, ScheduleEvent::WellProductivityIndex);
            if !ctx.update.welpi_wells.contains(&name) {
                ctx.update.welpi_wells.push(name.clone());
            }
            ctx.update.affected_wells.insert(name);
        }
    }
    Ok(())
}

fn handle_wlist(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    let keyword = ctx.keyword;
    for record in &keyword.records {
        let name = keyword.required_item(record, 0)?;
        if !WListManager::is_list_name(name) {
            return Err(ctx.invalid(name));
        }
        let op = keyword
            .required_item(record, 1)?
            .parse::<WListOp>()
            .map_err(|raw| ctx.invalid(&raw))?;

        let mut wells = Vec::new();
        for pattern in record.iter().skip(2) {
            wells.extend(ctx.wells(state, pattern));
        }
        state.wlist_manager_mut().apply(op, name, &wells);
        state.events.add(ScheduleEvent::WellListChange);
    }
    Ok(())
}

fn handle_gruptree(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    let keyword = ctx.keyword;
    for record in &keyword.records {
        let child = keyword.required_item(record, 0)?;
        let parent = keyword.item(record, 1).unwrap_or("FIELD");
        if child == "FIELD" {
            return Err(ctx.invalid(child));
        }
        ensure_group(state, parent, "FIELD");
        ensure_group(state, child, parent);
        if let Some(group) = state.groups_mut().get_mut(child) {
            group.parent = Some(parent.to_string());
        }
        state.events.add(ScheduleEvent::GroupChange);
        state.wellgroup_events.add(child, ScheduleEvent::GroupChange);
    }
    Ok(())
}

/// First record names the well; each following record adds the segment
/// range in its first two items.
fn handle_welsegs(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    let keyword = ctx.keyword;
    let Some((header, ranges)) = keyword.records.split_first() else {
        return Ok(());
    };
    let well = keyword.required_item(header, 0)?.to_string();
    if !state.wells().contains_key(&well) {
        return Err(ctx.invalid(&well));
    }

    let mut segments = vec![1];
    for record in ranges {
        let first: usize = keyword
            .parse_item(record, 0)?
            .ok_or_else(|| ctx.invalid("*"))?;
        let last: usize = keyword.parse_item(record, 1)?.unwrap_or(first);
        segments.extend(first..=last);
    }
    segments.sort_unstable();
    segments.dedup();

    state.segments_mut().insert(well.clone(), segments);
    state.events.add(ScheduleEvent::NewSegments);
    state.wellgroup_events.add(&well, ScheduleEvent::NewSegments);
    ctx.update.affected_wells.insert(well);
    Ok(())
}

fn handle_udq(state: &mut ScheduleState, ctx: &mut HandlerContext<'_>) -> Result<(), ScheduleError> {
    let keyword = ctx.keyword;
    for record in &keyword.records {
        state.udq_mut().add_record(
            record,
            &keyword.location,
            ctx.report_step,
            ctx.parse_context,
            ctx.guard,
        )?;
    }
    state.events.add(ScheduleEvent::UdqChange);
    Ok(())
}
