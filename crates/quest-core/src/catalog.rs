//! Static catalogs: zones, problems, MCQs, and the rank table. Built once at
//! process start and never mutated.

use contracts::{
    Difficulty, McqDefinition, ProblemDefinition, RankThreshold, TestCase, ZoneDefinition,
};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct Catalog {
    zones: Vec<ZoneDefinition>,
    problems: Vec<ProblemDefinition>,
    mcqs: Vec<McqDefinition>,
    ranks: Vec<RankThreshold>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            zones: builtin_zones(),
            problems: builtin_problems(),
            mcqs: builtin_mcqs(),
            ranks: builtin_ranks(),
        }
    }

    pub fn zones(&self) -> &[ZoneDefinition] {
        &self.zones
    }

    pub fn problems(&self) -> &[ProblemDefinition] {
        &self.problems
    }

    pub fn ranks(&self) -> &[RankThreshold] {
        &self.ranks
    }

    pub fn zone(&self, zone_id: &str) -> Option<&ZoneDefinition> {
        self.zones.iter().find(|zone| zone.id == zone_id)
    }

    pub fn problem(&self, problem_id: &str) -> Option<&ProblemDefinition> {
        self.problems.iter().find(|problem| problem.id == problem_id)
    }

    pub fn mcq(&self, mcq_id: &str) -> Option<&McqDefinition> {
        self.mcqs.iter().find(|mcq| mcq.id == mcq_id)
    }

    /// Problems of a zone in declaration order.
    pub fn problems_in_zone<'a>(
        &'a self,
        zone_id: &'a str,
    ) -> impl Iterator<Item = &'a ProblemDefinition> {
        self.problems
            .iter()
            .filter(move |problem| problem.zone == zone_id)
    }

    pub fn mcqs_in_zone<'a>(&'a self, zone_id: &'a str) -> impl Iterator<Item = &'a McqDefinition> {
        self.mcqs.iter().filter(move |mcq| mcq.zone == zone_id)
    }

    /// Rank for a running total: highest threshold at or below `experience`.
    pub fn rank_for(&self, experience: u64) -> &RankThreshold {
        self.ranks
            .iter()
            .rev()
            .find(|rank| rank.min_xp <= experience)
            .unwrap_or(&self.ranks[0])
    }

    pub fn next_rank_after(&self, experience: u64) -> Option<&RankThreshold> {
        self.ranks.iter().find(|rank| rank.min_xp > experience)
    }
}

fn builtin_zones() -> Vec<ZoneDefinition> {
    vec![
        ZoneDefinition {
            id: "arrays".to_string(),
            display_name: "Arrays".to_string(),
            icon: "📦".to_string(),
            unlock_threshold: 0,
        },
        ZoneDefinition {
            id: "recursion".to_string(),
            display_name: "Recursion".to_string(),
            icon: "🔄".to_string(),
            unlock_threshold: 150,
        },
        ZoneDefinition {
            id: "strings".to_string(),
            display_name: "Strings".to_string(),
            icon: "📝".to_string(),
            unlock_threshold: 400,
        },
    ]
}

fn builtin_ranks() -> Vec<RankThreshold> {
    vec![
        RankThreshold::new(0, "Trainee", "⚔️"),
        RankThreshold::new(300, "Coder", "🗡️"),
        RankThreshold::new(800, "DSA Fighter", "⚔️"),
        RankThreshold::new(1500, "Algorithm Knight", "🛡️"),
        RankThreshold::new(3000, "Code Master", "👑"),
    ]
}

struct ProblemEntry {
    id: &'static str,
    title: &'static str,
    zone: &'static str,
    difficulty: Difficulty,
    description: &'static str,
    starter_source: &'static str,
    tests: Vec<TestCase>,
    base_reward: u64,
    kb_key: &'static str,
}

fn problem(entry: ProblemEntry) -> ProblemDefinition {
    ProblemDefinition {
        id: entry.id.to_string(),
        title: entry.title.to_string(),
        zone: entry.zone.to_string(),
        difficulty: entry.difficulty,
        description: entry.description.to_string(),
        starter_source: entry.starter_source.to_string(),
        tests: entry.tests,
        base_reward: entry.base_reward,
        kb_key: entry.kb_key.to_string(),
    }
}

fn builtin_problems() -> Vec<ProblemDefinition> {
    vec![
        problem(ProblemEntry {
            id: "A1",
            title: "Sum of Array",
            zone: "arrays",
            difficulty: Difficulty::Easy,
            description: "Return the sum of all elements in the array",
            starter_source: "fn solve(arr) {\n    // your code here\n}\n",
            tests: vec![
                TestCase::new(json!([1, 2, 3]), json!(6)),
                TestCase::new(json!([10, 20]), json!(30)),
                TestCase::new(json!([5]), json!(5)),
            ],
            base_reward: 40,
            kb_key: "general_logic",
        }),
        problem(ProblemEntry {
            id: "A2",
            title: "Reverse Array",
            zone: "arrays",
            difficulty: Difficulty::Easy,
            description: "Return the reversed array",
            starter_source: "fn solve(arr) {\n    // your code here\n}\n",
            tests: vec![
                TestCase::new(json!([1, 2, 3]), json!([3, 2, 1])),
                TestCase::new(json!([5, 1]), json!([1, 5])),
            ],
            base_reward: 50,
            kb_key: "general_logic",
        }),
        problem(ProblemEntry {
            id: "A3",
            title: "Find Minimum",
            zone: "arrays",
            difficulty: Difficulty::Easy,
            description: "Return the minimum element in the array",
            starter_source: "fn solve(arr) {\n    // your code here\n}\n",
            tests: vec![
                TestCase::new(json!([3, 1, 2]), json!(1)),
                TestCase::new(json!([9, 5]), json!(5)),
            ],
            base_reward: 50,
            kb_key: "general_logic",
        }),
        problem(ProblemEntry {
            id: "A4",
            title: "Two Sum",
            zone: "arrays",
            difficulty: Difficulty::Medium,
            description: "Return indices of two numbers that add up to target. Input: [arr, target]",
            starter_source: "fn solve(data) {\n    let arr = data[0];\n    let target = data[1];\n    // return [index1, index2]\n}\n",
            tests: vec![
                TestCase::new(json!([[2, 7, 11, 15], 9]), json!([0, 1])),
                TestCase::new(json!([[3, 2, 4], 6]), json!([1, 2])),
            ],
            base_reward: 80,
            kb_key: "general_logic",
        }),
        problem(ProblemEntry {
            id: "A_BOSS",
            title: "Array Boss: Second Largest",
            zone: "arrays",
            difficulty: Difficulty::Boss,
            description: "Return the second largest element (no duplicates in result)",
            starter_source: "fn solve(arr) {\n    // find the second largest element\n    // example: [9, 9, 8] -> 8\n}\n",
            tests: vec![
                TestCase::new(json!([1, 2, 3, 4]), json!(3)),
                TestCase::new(json!([9, 9, 8]), json!(8)),
                TestCase::new(json!([5, 1]), json!(1)),
            ],
            base_reward: 120,
            kb_key: "arrays_second_largest",
        }),
        problem(ProblemEntry {
            id: "R1",
            title: "Factorial",
            zone: "recursion",
            difficulty: Difficulty::Easy,
            description: "Return the factorial of n using recursion",
            starter_source: "fn solve(n) {\n    // your recursive code here\n}\n",
            tests: vec![
                TestCase::new(json!(5), json!(120)),
                TestCase::new(json!(3), json!(6)),
                TestCase::new(json!(0), json!(1)),
            ],
            base_reward: 60,
            kb_key: "recursion_base_case",
        }),
        problem(ProblemEntry {
            id: "R2",
            title: "Fibonacci",
            zone: "recursion",
            difficulty: Difficulty::Medium,
            description: "Return the nth Fibonacci number (0-indexed)",
            starter_source: "fn solve(n) {\n    // 0, 1, 1, 2, 3, 5, 8...\n}\n",
            tests: vec![
                TestCase::new(json!(0), json!(0)),
                TestCase::new(json!(5), json!(5)),
                TestCase::new(json!(10), json!(55)),
            ],
            base_reward: 90,
            kb_key: "recursion_base_case",
        }),
        problem(ProblemEntry {
            id: "R3",
            title: "Sum of Digits",
            zone: "recursion",
            difficulty: Difficulty::Medium,
            description: "Return the sum of all digits in a number using recursion",
            starter_source: "fn solve(n) {\n    // example: 123 -> 1 + 2 + 3 = 6\n}\n",
            tests: vec![
                TestCase::new(json!(123), json!(6)),
                TestCase::new(json!(9999), json!(36)),
                TestCase::new(json!(5), json!(5)),
            ],
            base_reward: 80,
            kb_key: "recursion_base_case",
        }),
        problem(ProblemEntry {
            id: "R_BOSS",
            title: "Recursion Boss: Power Function",
            zone: "recursion",
            difficulty: Difficulty::Boss,
            description: "Implement pow(base, exp) using recursion. Input: [base, exp]",
            starter_source: "fn solve(data) {\n    let base = data[0];\n    let exp = data[1];\n    // return base^exp using recursion\n}\n",
            tests: vec![
                TestCase::new(json!([2, 10]), json!(1024)),
                TestCase::new(json!([3, 4]), json!(81)),
                TestCase::new(json!([5, 0]), json!(1)),
            ],
            base_reward: 150,
            kb_key: "recursion_base_case",
        }),
        problem(ProblemEntry {
            id: "S1",
            title: "Reverse String",
            zone: "strings",
            difficulty: Difficulty::Easy,
            description: "Return the reversed string",
            starter_source: "fn solve(s) {\n    // your code here\n}\n",
            tests: vec![
                TestCase::new(json!("hello"), json!("olleh")),
                TestCase::new(json!("world"), json!("dlrow")),
            ],
            base_reward: 40,
            kb_key: "general_logic",
        }),
        problem(ProblemEntry {
            id: "S2",
            title: "Palindrome Check",
            zone: "strings",
            difficulty: Difficulty::Medium,
            description: "Return true if the string is a palindrome, false otherwise. Ignore case and spaces.",
            starter_source: "fn solve(s) {\n    // ignore case and spaces\n}\n",
            tests: vec![
                TestCase::new(json!("racecar"), json!(true)),
                TestCase::new(json!("hello"), json!(false)),
                TestCase::new(json!("A man a plan a canal Panama"), json!(true)),
            ],
            base_reward: 70,
            kb_key: "general_logic",
        }),
    ]
}

fn builtin_mcqs() -> Vec<McqDefinition> {
    let mcq = |id: &str, zone: &str, prompt: &str, choices: &[&str], answer_index: usize| {
        McqDefinition {
            id: id.to_string(),
            zone: zone.to_string(),
            prompt: prompt.to_string(),
            choices: choices.iter().map(|choice| choice.to_string()).collect(),
            answer_index,
            reward: 10,
        }
    };
    vec![
        mcq(
            "M_A1",
            "arrays",
            "Which structure uses contiguous memory?",
            &["Array", "Linked list", "Hash map", "Graph"],
            0,
        ),
        mcq(
            "M_A2",
            "arrays",
            "Index access time of an array?",
            &["O(n)", "O(1)", "O(log n)", "O(n log n)"],
            1,
        ),
        mcq(
            "M_R1",
            "recursion",
            "What stops a recursive function?",
            &["The call stack", "A loop guard", "The base case", "The return type"],
            2,
        ),
        mcq(
            "M_R2",
            "recursion",
            "Which stack does recursion use?",
            &["Heap", "Call stack", "Queue", "Register file"],
            1,
        ),
    ]
}
