//! The exception-region reconstructor (C8): turns a method's flat clause
//! table into a multimap from byte offset to the nested begin/end markers the
//! method emitter interleaves with instructions.

use std::collections::HashSet;

use fxhash::FxHashMap;

use crate::metadata::{ExceptionClause, ExceptionHandlingClauseFlags, TypeHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
	Try,
	Catch,
	FilterCatch,
	Filter,
	Finally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
	Begin,
	End,
}

#[derive(Debug)]
pub struct RegionMarker {
	pub kind: RegionKind,
	pub side: Side,
	pub catch_type: Option<Box<dyn TypeHandle>>,
}

impl RegionMarker {
	fn plain(kind: RegionKind, side: Side) -> Self {
		Self { kind, side, catch_type: None }
	}
}

/// Builds the offset-keyed marker multimap (§4.6). Clauses are consumed in
/// input order and markers at a shared offset are appended in that same
/// order, matching the reference behavior the method emitter depends on.
/// Takes the clause list by value so a `Catch` clause's resolved type can
/// move straight into its marker instead of requiring `TypeHandle: Clone`.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(clauses)))]
pub fn reconstruct(clauses: Vec<ExceptionClause>) -> FxHashMap<u32, Vec<RegionMarker>> {
	let mut markers: FxHashMap<u32, Vec<RegionMarker>> = FxHashMap::default();
	let mut seen_try_regions: HashSet<(u32, u32)> = HashSet::new();

	let mut push = |markers: &mut FxHashMap<u32, Vec<RegionMarker>>, offset: u32, marker: RegionMarker| {
		markers.entry(offset).or_default().push(marker);
	};

	for clause in clauses {
		let try_region = (clause.try_offset, clause.try_length);

		if clause.flags.contains(ExceptionHandlingClauseFlags::FILTER) {
			if seen_try_regions.insert(try_region) {
				push(&mut markers, clause.try_offset, RegionMarker::plain(RegionKind::Try, Side::Begin));
				push(&mut markers, clause.try_offset + clause.try_length, RegionMarker::plain(RegionKind::Try, Side::End));
			}

			let filter_offset = clause.filter_offset.unwrap_or(clause.handler_offset);
			push(&mut markers, filter_offset, RegionMarker::plain(RegionKind::Filter, Side::Begin));
			push(&mut markers, clause.handler_offset, RegionMarker::plain(RegionKind::Filter, Side::End));
			push(&mut markers, clause.handler_offset, RegionMarker::plain(RegionKind::FilterCatch, Side::Begin));
			push(
				&mut markers,
				clause.handler_offset + clause.handler_length,
				RegionMarker::plain(RegionKind::FilterCatch, Side::End),
			);
			continue;
		}

		seen_try_regions.insert(try_region);
		push(&mut markers, clause.try_offset, RegionMarker::plain(RegionKind::Try, Side::Begin));
		push(&mut markers, clause.try_offset + clause.try_length, RegionMarker::plain(RegionKind::Try, Side::End));

		if clause.flags.contains(ExceptionHandlingClauseFlags::FINALLY)
			|| clause.flags.contains(ExceptionHandlingClauseFlags::FAULT)
		{
			// Fault is not evidenced in the reference behavior; treated as
			// Finally by analogy, per the open question this crate resolves
			// explicitly rather than dropping the clause.
			push(&mut markers, clause.handler_offset, RegionMarker::plain(RegionKind::Finally, Side::Begin));
			push(
				&mut markers,
				clause.handler_offset + clause.handler_length,
				RegionMarker::plain(RegionKind::Finally, Side::End),
			);
		} else {
			let handler_offset = clause.handler_offset;
			let handler_end = clause.handler_offset + clause.handler_length;
			push(
				&mut markers,
				handler_offset,
				RegionMarker { kind: RegionKind::Catch, side: Side::Begin, catch_type: clause.catch_type },
			);
			push(&mut markers, handler_end, RegionMarker::plain(RegionKind::Catch, Side::End));
		}
	}

	markers
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metadata::ExceptionHandlingClauseFlags as Flags;

	fn clause(flags: Flags, try_offset: u32, try_length: u32, handler_offset: u32, handler_length: u32) -> ExceptionClause {
		ExceptionClause { flags, try_offset, try_length, handler_offset, handler_length, filter_offset: None, catch_type: None }
	}

	#[test]
	fn finally_clause_emits_try_and_finally_markers() {
		let clauses = vec![clause(Flags::FINALLY, 0, 10, 10, 5)];
		let markers = reconstruct(clauses);
		assert_eq!(markers[&0][0].kind, RegionKind::Try);
		assert_eq!(markers[&0][0].side, Side::Begin);
		assert_eq!(markers[&10][0].kind, RegionKind::Try);
		assert_eq!(markers[&10][0].side, Side::End);
		assert_eq!(markers[&10][1].kind, RegionKind::Finally);
		assert_eq!(markers[&10][1].side, Side::Begin);
		assert_eq!(markers[&15][0].kind, RegionKind::Finally);
		assert_eq!(markers[&15][0].side, Side::End);
	}

	#[test]
	fn back_to_back_filters_over_the_same_try_dedupe_the_try_markers() {
		let mut first = clause(Flags::FILTER, 0, 10, 20, 5);
		first.filter_offset = Some(10);
		let mut second = clause(Flags::FILTER, 0, 10, 30, 5);
		second.filter_offset = Some(25);
		let markers = reconstruct(vec![first, second]);

		let try_begins = markers[&0].iter().filter(|m| m.kind == RegionKind::Try && m.side == Side::Begin).count();
		assert_eq!(try_begins, 1);
		let try_ends = markers[&10].iter().filter(|m| m.kind == RegionKind::Try && m.side == Side::End).count();
		assert_eq!(try_ends, 1);
	}

	#[test]
	fn fault_is_treated_as_finally() {
		let clauses = vec![clause(Flags::FAULT, 0, 4, 4, 2)];
		let markers = reconstruct(clauses);
		assert_eq!(markers[&4][1].kind, RegionKind::Finally);
	}
}
