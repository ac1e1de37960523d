//! Debug-only comparator for round-trip regression testing: walks two
//! projects list-by-list, item-by-item, member-by-member and reports every
//! first-order mismatch through the caller's sink.

use crate::beat::approx_same;
use crate::accessor::{GenericList, GenericMember, GenericValue, generic_list_len, get_generic};
use crate::model::ChartProject;

fn values_match(a: &GenericValue, b: &GenericValue) -> bool {
    match (a, b) {
        (GenericValue::F32(x), GenericValue::F32(y)) => approx_same(*x as f64, *y as f64),
        (GenericValue::Complex(x), GenericValue::Complex(y)) => {
            approx_same(x.real as f64, y.real as f64) && approx_same(x.imag as f64, y.imag as f64)
        }
        (GenericValue::Time(x), GenericValue::Time(y)) => approx_same(x.seconds, y.seconds),
        (GenericValue::Tempo(x), GenericValue::Tempo(y)) => approx_same(x.bpm, y.bpm),
        _ => a == b,
    }
}

/// Compare two projects, invoking `on_message` once per mismatch. Selection
/// flags are excluded; floating-point members compare approximately.
pub fn debug_compare_charts(
    chart_a: &ChartProject,
    chart_b: &ChartProject,
    mut on_message: impl FnMut(&str),
) {
    if chart_a.courses.len() != chart_b.courses.len() {
        on_message(&format!(
            "Course count mismatch ({} != {})",
            chart_a.courses.len(),
            chart_b.courses.len()
        ));
        return;
    }

    for (course_a, course_b) in chart_a.courses.iter().zip(&chart_b.courses) {
        for list in GenericList::ALL {
            let count_a = generic_list_len(course_a, list);
            let count_b = generic_list_len(course_b, list);
            if count_a != count_b {
                on_message(&format!(
                    "{list:?} count mismatch ({count_a} != {count_b})"
                ));
                continue;
            }

            for index in 0..count_a {
                for member in GenericMember::ALL {
                    if member == GenericMember::IsSelected {
                        continue;
                    }
                    let value_a = get_generic(course_a, list, index, member);
                    let value_b = get_generic(course_b, list, index, member);
                    debug_assert_eq!(value_a.is_some(), value_b.is_some());
                    let (Some(value_a), Some(value_b)) = (value_a, value_b) else {
                        continue;
                    };
                    if !values_match(&value_a, &value_b) {
                        on_message(&format!("{list:?}[{index}].{member:?} value mismatch"));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::{Beat, Tempo};
    use crate::events::TempoChange;
    use crate::model::ChartCourse;
    use crate::note::{Note, NoteType};

    fn collect_messages(a: &ChartProject, b: &ChartProject) -> Vec<String> {
        let mut messages = Vec::new();
        debug_compare_charts(a, b, |m| messages.push(m.to_string()));
        messages
    }

    fn single_course_project() -> ChartProject {
        let mut course = ChartCourse::default();
        let mut balloon = Note::new(Beat::from_beats(2), NoteType::Balloon);
        balloon.balloon_pop_count = 5;
        course.notes_normal.insert_or_update(balloon);
        ChartProject {
            courses: vec![course],
            ..ChartProject::default()
        }
    }

    #[test]
    fn identical_projects_produce_no_messages() {
        let a = single_course_project();
        assert!(collect_messages(&a, &a.clone()).is_empty());
    }

    #[test]
    fn course_count_mismatch_short_circuits() {
        let a = single_course_project();
        let b = ChartProject::default();
        let messages = collect_messages(&a, &b);
        assert_eq!(messages, vec!["Course count mismatch (1 != 0)"]);
    }

    #[test]
    fn single_member_difference_yields_single_message() {
        let a = single_course_project();
        let mut b = a.clone();
        b.courses[0].notes_normal[0].balloon_pop_count = 6;
        let messages = collect_messages(&a, &b);
        assert_eq!(messages, vec!["NotesNormal[0].BalloonPopCount value mismatch"]);
    }

    #[test]
    fn selection_flags_are_ignored() {
        let a = single_course_project();
        let mut b = a.clone();
        b.courses[0].notes_normal[0].is_selected = true;
        assert!(collect_messages(&a, &b).is_empty());
    }

    #[test]
    fn count_mismatch_reported_once_per_list() {
        let a = single_course_project();
        let mut b = a.clone();
        b.courses[0]
            .notes_normal
            .insert_or_update(Note::new(Beat::from_beats(4), NoteType::Don));
        let messages = collect_messages(&a, &b);
        assert_eq!(messages, vec!["NotesNormal count mismatch (1 != 2)"]);
    }

    #[test]
    fn tempo_compares_with_tolerance() {
        let a = single_course_project();
        let mut b = a.clone();
        b.courses[0]
            .tempo_map
            .tempo
            .insert_or_update(TempoChange::new(Beat::zero(), Tempo::new(120.0 + 1e-6)));
        assert!(collect_messages(&a, &b).is_empty());

        let mut c = a.clone();
        c.courses[0]
            .tempo_map
            .tempo
            .insert_or_update(TempoChange::new(Beat::zero(), Tempo::new(121.0)));
        let messages = collect_messages(&a, &c);
        assert_eq!(messages, vec!["TempoChanges[0].Tempo value mismatch"]);
    }
}
