use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// one stop of a direction topology, as carried through the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyStop {
    pub stop_name: String,
    #[serde(rename = "stopGTFSID")]
    pub stop_gtfs_id: String,
    pub stop_number: Option<String>,
    pub suburb: Option<String>,
}

impl TopologyStop {
    pub fn named(stop_name: &str, stop_gtfs_id: &str) -> TopologyStop {
        TopologyStop {
            stop_name: stop_name.to_string(),
            stop_gtfs_id: stop_gtfs_id.to_string(),
            stop_number: None,
            suburb: None,
        }
    }
}

/// a deterministic hash of the stop-id sequence, the sort tie-break for
/// equal-length variants. `DefaultHasher::new` hashes with fixed keys, so
/// repeated runs order identically.
fn sequence_hash(sequence: &[TopologyStop]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for stop in sequence {
        stop.stop_gtfs_id.hash(&mut hasher);
    }
    hasher.finish()
}

fn is_loop(sequence: &[TopologyStop]) -> bool {
    match (sequence.first(), sequence.last()) {
        (Some(first), Some(last)) => first.stop_name == last.stop_name,
        _ => false,
    }
}

fn names_equal(a: &TopologyStop, b: &TopologyStop) -> bool {
    a.stop_name == b.stop_name
}

/// merges the observed stopping patterns of one route direction into a
/// single canonical ordering covering every variant.
///
/// degenerate single-stop sequences are discarded; the rest are ordered
/// longest first (ties broken by the sequence hash) with loop variants
/// ahead of non-loops, since a loop anchors the base path. the longest
/// variant seeds the canonical list and every later variant is walked
/// stop by stop against it:
///
/// - stops absent from the canonical list accumulate in a branch buffer
/// - on a rejoin, the buffered branch is spliced in immediately before the
///   matched position
/// - a match behind the last confirmed point (the variant jumped backward,
///   e.g. revisiting a loop) folds the variant's out-of-order span into the
///   branch instead of resetting
/// - a branch still open after the last stop is a diverging destination and
///   is spliced in immediately after the last confirmed point
pub fn merge_sequences(input_variants: &[Vec<TopologyStop>]) -> Vec<TopologyStop> {
    let mut ordered: Vec<&Vec<TopologyStop>> = input_variants.iter().collect();
    ordered.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| sequence_hash(a).cmp(&sequence_hash(b)))
    });

    let mut loop_variants: Vec<&Vec<TopologyStop>> = Vec::new();
    let mut non_loop_variants: Vec<&Vec<TopologyStop>> = Vec::new();
    for variant in ordered {
        if variant.len() <= 1 {
            continue;
        }
        if is_loop(variant) {
            loop_variants.push(variant);
        } else {
            non_loop_variants.push(variant);
        }
    }

    let variants: Vec<&Vec<TopologyStop>> =
        loop_variants.into_iter().chain(non_loop_variants).collect();
    let Some((seed, rest)) = variants.split_first() else {
        return Vec::new();
    };
    let mut stops_list: Vec<TopologyStop> = (*seed).clone();

    for variant in rest {
        let mut branch: Vec<TopologyStop> = Vec::new();
        let mut last_main_match = 0usize;

        for variant_stop in variant.iter() {
            let match_index = stops_list
                .iter()
                .position(|stop| names_equal(stop, variant_stop));

            match match_index {
                Some(match_index) => {
                    if !branch.is_empty() {
                        // lines were out of sync and a match means the
                        // variant is rejoining: splice the deviation in
                        // before the rejoin point
                        let tail = stops_list.split_off(match_index);
                        stops_list.append(&mut branch);
                        stops_list.extend(tail);
                    } else {
                        if match_index < last_main_match {
                            // the variant jumped backward relative to the
                            // canonical list, e.g. revisiting a stop on a
                            // loop. fold the out-of-order span of the
                            // variant into the branch rather than resetting
                            let jump_end = (last_main_match + 1).min(variant.len());
                            let jump_start = match_index.min(jump_end);
                            for jump_stop in &variant[jump_start..jump_end] {
                                if names_equal(jump_stop, variant_stop) {
                                    break;
                                }
                                branch.push(jump_stop.clone());
                            }
                        }
                        last_main_match = match_index;
                    }
                }
                // no match anywhere ahead: the variant is on a branch
                None => branch.push(variant_stop.clone()),
            }
        }

        if !branch.is_empty() {
            // the variant never rejoined, it runs to a different
            // destination: join it in right after the last common stop
            let tail = stops_list.split_off(last_main_match + 1);
            stops_list.append(&mut branch);
            stops_list.extend(tail);
        }
    }

    stops_list
}

#[cfg(test)]
mod test {
    use super::{merge_sequences, TopologyStop};

    fn sequence(stops: &[(&str, &str)]) -> Vec<TopologyStop> {
        stops
            .iter()
            .map(|(name, id)| TopologyStop::named(name, id))
            .collect()
    }

    fn names(stops: &[TopologyStop]) -> Vec<&str> {
        stops.iter().map(|stop| stop.stop_name.as_str()).collect()
    }

    #[test]
    fn test_inserts_a_deviation_between_its_rejoin_points() {
        // the Altona loop: a short variant deviates off the main line at
        // Newport and rejoins at Laverton
        let variants = vec![
            sequence(&[
                ("Yarraville", "19996"),
                ("Spotswood", "19995"),
                ("Newport", "19994"),
                ("Seaholme", "19927"),
                ("Altona", "19926"),
                ("Westona", "19925"),
                ("Laverton", "19923"),
                ("Aircraft", "19924"),
            ]),
            sequence(&[
                ("North Melbourne", "19973"),
                ("South Kensington", "20026"),
                ("Footscray", "20025"),
                ("Seddon", "19997"),
                ("Yarraville", "19996"),
                ("Spotswood", "19995"),
                ("Newport", "19994"),
                ("Laverton", "19923"),
                ("Aircraft", "19924"),
                ("Williams Landing", "46468"),
                ("Hoppers Crossing", "19922"),
                ("Werribee", "19921"),
            ]),
        ];

        assert_eq!(
            names(&merge_sequences(&variants)),
            vec![
                "North Melbourne",
                "South Kensington",
                "Footscray",
                "Seddon",
                "Yarraville",
                "Spotswood",
                "Newport",
                "Seaholme",
                "Altona",
                "Westona",
                "Laverton",
                "Aircraft",
                "Williams Landing",
                "Hoppers Crossing",
                "Werribee",
            ]
        );
    }

    #[test]
    fn test_merges_two_branches() {
        let variants = vec![
            sequence(&[
                ("Blackburn Road/Ferntree Gully Road", "13038"),
                ("Blackburn Road/Normanby Road", "15418"),
                ("Howleys Road/Normanby Road", "15419"),
                ("Monash University/Research Way", "22447"),
                ("Hilltop Avenue/Gardiner Road", "22445"),
                ("Ferntree Gully Road/Gardiner Road", "22442"),
                ("Gardiner Road/Ferntree Gully Road", "13043"),
            ]),
            sequence(&[
                ("Blackburn Road/Ferntree Gully Road", "13038"),
                ("Blackburn Road/Normanby Road", "15418"),
                ("Howleys Road/Normanby Road", "15419"),
                ("CSIRO/Normanby Road", "40973"),
                ("Ferntree Gully Road/Gardiner Road", "22442"),
                ("Gardiner Road/Ferntree Gully Road", "13043"),
            ]),
        ];

        assert_eq!(
            names(&merge_sequences(&variants)),
            vec![
                "Blackburn Road/Ferntree Gully Road",
                "Blackburn Road/Normanby Road",
                "Howleys Road/Normanby Road",
                "Monash University/Research Way",
                "Hilltop Avenue/Gardiner Road",
                "CSIRO/Normanby Road",
                "Ferntree Gully Road/Gardiner Road",
                "Gardiner Road/Ferntree Gully Road",
            ]
        );
    }

    #[test]
    fn test_an_overlapping_deviation_creates_no_extra_stops() {
        // a short city variant skips the loop; every stop it has already
        // exists on the full variant
        let full = sequence(&[
            ("Flinders Street Railway Station", "19854"),
            ("Southern Cross Railway Station", "22180"),
            ("Flagstaff Railway Station", "19841"),
            ("Melbourne Central Railway Station", "19842"),
            ("Parliament Railway Station", "19843"),
            ("Richmond Railway Station", "19908"),
            ("East Richmond Railway Station", "19907"),
            ("Burnley Railway Station", "19906"),
            ("Hawthorn Railway Station", "19905"),
            ("Glenferrie Railway Station", "19904"),
            ("Auburn Railway Station", "19903"),
            ("Camberwell Railway Station", "19853"),
        ]);
        let direct = sequence(&[
            ("Flinders Street Railway Station", "19854"),
            ("Richmond Railway Station", "19908"),
            ("East Richmond Railway Station", "19907"),
            ("Burnley Railway Station", "19906"),
            ("Hawthorn Railway Station", "19905"),
            ("Glenferrie Railway Station", "19904"),
            ("Auburn Railway Station", "19903"),
            ("Camberwell Railway Station", "19853"),
        ]);

        let merged = merge_sequences(&[full.clone(), direct]);
        assert_eq!(merged, full);
    }

    #[test]
    fn test_merges_loop_variants_into_one_ordering() {
        let variants = vec![
            sequence(&[
                ("Flinders Street Railway Station", "19854"),
                ("Southern Cross Railway Station", "22180"),
                ("North Melbourne Railway Station", "19973"),
                ("Macaulay Railway Station", "19972"),
            ]),
            sequence(&[
                ("Flinders Street Railway Station", "19854"),
                ("Parliament Railway Station", "19843"),
                ("Melbourne Central Railway Station", "19842"),
                ("Flagstaff Railway Station", "19841"),
                ("North Melbourne Railway Station", "19973"),
                ("Macaulay Railway Station", "19972"),
            ]),
        ];

        assert_eq!(
            names(&merge_sequences(&variants)),
            vec![
                "Flinders Street Railway Station",
                "Parliament Railway Station",
                "Melbourne Central Railway Station",
                "Flagstaff Railway Station",
                "Southern Cross Railway Station",
                "North Melbourne Railway Station",
                "Macaulay Railway Station",
            ]
        );
    }

    #[test]
    fn test_a_diverging_destination_joins_after_the_deviation_point() {
        let common = [
            ("Stud Park Shopping Centre", "21314"),
            ("Rowville Community Centre/Fulham Road", "13339"),
            ("Erie Avenue/Bridgewater Way", "13346"),
            ("Kelletts Road/Taylors Lane", "15227"),
        ];
        let to_knox = [
            ("Lakeside Boulevard/Stud Road", "15150"),
            ("Kingsley Close/Stud Road", "15152"),
            ("Knox City Shopping Centre/Burwood Highway", "19629"),
        ];
        let to_waverley = [
            ("Turramurra Drive/Stud Road", "14176"),
            ("Waverley Gardens Shopping Centre/Hansworth Street", "21310"),
        ];

        let longer: Vec<(&str, &str)> =
            common.iter().chain(to_knox.iter()).copied().collect();
        let shorter: Vec<(&str, &str)> =
            common.iter().chain(to_waverley.iter()).copied().collect();
        let variants = vec![sequence(&longer), sequence(&shorter)];

        let expected: Vec<(&str, &str)> = common
            .iter()
            .chain(to_waverley.iter())
            .chain(to_knox.iter())
            .copied()
            .collect();
        assert_eq!(merge_sequences(&variants), sequence(&expected));
    }

    #[test]
    fn test_every_input_stop_appears_in_the_output() {
        let variants = vec![
            sequence(&[("a", "1"), ("b", "2"), ("e", "5"), ("f", "6")]),
            sequence(&[("a", "1"), ("c", "3"), ("d", "4"), ("f", "6")]),
            sequence(&[("b", "2"), ("e", "5"), ("g", "7")]),
        ];
        let merged = merge_sequences(&variants);
        for variant in &variants {
            for stop in variant {
                assert!(
                    merged.iter().any(|s| s.stop_name == stop.stop_name),
                    "stop {} missing from merge",
                    stop.stop_name
                );
            }
        }
    }

    #[test]
    fn test_merge_is_deterministic_under_input_permutation() {
        let variants = vec![
            sequence(&[("a", "1"), ("b", "2"), ("c", "3"), ("f", "6")]),
            sequence(&[("a", "1"), ("d", "4"), ("e", "5"), ("f", "6")]),
            sequence(&[("a", "1"), ("b", "2"), ("e", "5"), ("f", "6")]),
        ];
        let expected = merge_sequences(&variants);

        let mut permuted = variants.clone();
        permuted.rotate_left(1);
        assert_eq!(merge_sequences(&permuted), expected);

        permuted.rotate_left(1);
        assert_eq!(merge_sequences(&permuted), expected);
    }

    #[test]
    fn test_degenerate_sequences_are_discarded() {
        let variants = vec![
            sequence(&[("a", "1")]),
            sequence(&[("a", "1"), ("b", "2")]),
        ];
        assert_eq!(names(&merge_sequences(&variants)), vec!["a", "b"]);
    }

    #[test]
    fn test_loop_revisit_inserts_once_never_duplicates() {
        // a loop service revisits its origin mid-variant; the backward jump
        // must not duplicate any canonical stop
        let variants = vec![
            sequence(&[
                ("city", "1"),
                ("north", "2"),
                ("east", "3"),
                ("city", "1"),
            ]),
            sequence(&[
                ("city", "1"),
                ("north", "2"),
                ("west", "9"),
                ("city", "1"),
            ]),
        ];
        let merged = merge_sequences(&variants);

        let count = |name: &str| {
            merged
                .iter()
                .filter(|stop| stop.stop_name == name)
                .count()
        };
        assert_eq!(count("north"), 1);
        assert_eq!(count("east"), 1);
        assert_eq!(count("west"), 1);
        assert!(merged.iter().any(|stop| stop.stop_name == "west"));
    }
}
