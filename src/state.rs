//! Shared allocation and seat state.
//!
//! Students and courses are dense indices into the sorted universes held by
//! [`UtilityModel`](crate::utility::UtilityModel), so comparing two indices
//! compares the underlying identifiers.
//!
//! Every mutator keeps two invariants and panics if a caller would break
//! them: seats left per course stay in `0..=cap_default`, and no student
//! holds more than `b` courses or the same course twice.

use std::collections::BTreeSet;

/// Allocation (student → courses) plus remaining seats per course.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationState {
    /// Courses per student in the order they were acquired.
    held: Vec<Vec<usize>>,
    /// Same courses as a sorted set for membership and ordered iteration.
    held_set: Vec<BTreeSet<usize>>,
    capacity_left: Vec<u32>,
    cap_default: u32,
    max_courses: usize,
}

impl AllocationState {
    /// Empty allocation with every course at full capacity.
    pub fn new(n_students: usize, n_courses: usize, cap_default: u32, max_courses: usize) -> Self {
        Self {
            held: vec![Vec::new(); n_students],
            held_set: vec![BTreeSet::new(); n_students],
            capacity_left: vec![cap_default; n_courses],
            cap_default,
            max_courses,
        }
    }

    pub fn n_students(&self) -> usize {
        self.held.len()
    }

    pub fn n_courses(&self) -> usize {
        self.capacity_left.len()
    }

    pub fn cap_default(&self) -> u32 {
        self.cap_default
    }

    pub fn max_courses(&self) -> usize {
        self.max_courses
    }

    /// Whether `student` currently holds `course`.
    #[inline]
    pub fn holds(&self, student: usize, course: usize) -> bool {
        self.held_set[student].contains(&course)
    }

    /// Courses held by `student`, in acquisition order.
    pub fn courses_of(&self, student: usize) -> &[usize] {
        &self.held[student]
    }

    /// Courses held by `student`, ascending.
    pub fn sorted_courses_of(&self, student: usize) -> impl Iterator<Item = usize> + '_ {
        self.held_set[student].iter().copied()
    }

    pub fn course_count(&self, student: usize) -> usize {
        self.held[student].len()
    }

    /// Whether `student` has reached the course budget.
    pub fn is_full(&self, student: usize) -> bool {
        self.held[student].len() >= self.max_courses
    }

    pub fn capacity_left(&self, course: usize) -> u32 {
        self.capacity_left[course]
    }

    pub fn has_seat(&self, course: usize) -> bool {
        self.capacity_left[course] > 0
    }

    /// Seats still open across all courses.
    pub fn unfilled_seats(&self) -> u64 {
        self.capacity_left.iter().map(|&c| c as u64).sum()
    }

    /// Fraction of seats taken in `course`.
    pub fn fill_rate(&self, course: usize) -> f64 {
        if self.cap_default == 0 {
            return 0.0;
        }
        (self.cap_default - self.capacity_left[course]) as f64 / self.cap_default as f64
    }

    /// Gives `course` to `student`, consuming a seat.
    pub fn assign(&mut self, student: usize, course: usize) {
        assert!(
            self.capacity_left[course] > 0,
            "seat underflow: course {course} has no seats left"
        );
        assert!(
            self.held[student].len() < self.max_courses,
            "student {student} already holds {} courses",
            self.max_courses
        );
        assert!(
            self.held_set[student].insert(course),
            "student {student} already holds course {course}"
        );
        self.held[student].push(course);
        self.capacity_left[course] -= 1;
    }

    /// Takes `course` back from `student`, returning the seat.
    pub fn release(&mut self, student: usize, course: usize) {
        assert!(
            self.held_set[student].remove(&course),
            "student {student} does not hold course {course}"
        );
        self.held[student].retain(|&c| c != course);
        assert!(
            self.capacity_left[course] < self.cap_default,
            "seat overflow: course {course} is already empty"
        );
        self.capacity_left[course] += 1;
    }

    /// Exchanges `c1` (held by `s1`) with `c2` (held by `s2`).
    ///
    /// Seat counts are unchanged. Each course keeps the other's slot in the
    /// acquisition order.
    pub fn swap(&mut self, s1: usize, c1: usize, s2: usize, c2: usize) {
        assert!(
            self.holds(s1, c1) && self.holds(s2, c2),
            "swap participants must hold the swapped courses"
        );
        assert!(
            !self.holds(s1, c2) && !self.holds(s2, c1),
            "swap would duplicate a course"
        );
        replace_in_order(&mut self.held[s1], c1, c2);
        replace_in_order(&mut self.held[s2], c2, c1);
        self.held_set[s1].remove(&c1);
        self.held_set[s1].insert(c2);
        self.held_set[s2].remove(&c2);
        self.held_set[s2].insert(c1);
    }

    /// Replaces the courses of `student` with `desired`.
    ///
    /// Seats are returned for dropped courses before new ones are taken.
    /// Kept courses stay in place; added ones follow in `desired` order.
    /// Returns `(dropped, added)`, both ascending.
    pub fn replace(&mut self, student: usize, desired: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let desired_set: BTreeSet<usize> = desired.iter().copied().collect();
        assert!(
            desired_set.len() == desired.len(),
            "desired courses for student {student} contain duplicates"
        );
        assert!(
            desired.len() <= self.max_courses,
            "desired courses for student {student} exceed the budget"
        );
        let dropped: Vec<usize> = self.held_set[student]
            .difference(&desired_set)
            .copied()
            .collect();
        let added: Vec<usize> = desired_set
            .difference(&self.held_set[student])
            .copied()
            .collect();

        for &c in &dropped {
            self.release(student, c);
        }
        for &c in desired {
            if added.binary_search(&c).is_ok() {
                self.assign(student, c);
            }
        }
        (dropped, added)
    }

    /// Panics if the list and set views of `student` disagree.
    pub fn audit_student(&self, student: usize) {
        let list = &self.held[student];
        let set = &self.held_set[student];
        assert_eq!(
            list.len(),
            set.len(),
            "allocation list/set size mismatch for student {student}"
        );
        assert!(
            list.iter().all(|c| set.contains(c)),
            "allocation list/set mismatch for student {student}"
        );
        assert!(
            list.len() <= self.max_courses,
            "student {student} exceeds the course budget"
        );
    }

    /// Panics if the seats left for `course` disagree with the holders.
    pub fn audit_course(&self, course: usize) {
        let assigned = self.held_set.iter().filter(|s| s.contains(&course)).count();
        assert!(
            assigned <= self.cap_default as usize,
            "capacity exceeded for course {course}: {assigned} > {}",
            self.cap_default
        );
        let expected = self.cap_default as usize - assigned;
        assert_eq!(
            self.capacity_left[course] as usize, expected,
            "seats left mismatch for course {course}"
        );
    }

    /// Audits every student and every course.
    pub fn audit(&self) {
        for s in 0..self.n_students() {
            self.audit_student(s);
        }
        for c in 0..self.n_courses() {
            self.audit_course(c);
        }
    }
}

fn replace_in_order(list: &mut [usize], from: usize, to: usize) {
    if let Some(slot) = list.iter_mut().find(|c| **c == from) {
        *slot = to;
    }
}
