//! Login accounting: who uses this machine most, and their directory groups.
//!
//! Usage comes from `ac`, the connect-time accounting tool: `ac -p` lists
//! users with any recorded session and `ac -d USER` prints one line per day
//! the user was logged in.

use std::env;

use hostfacts_engine::{FactMap, FactValue, ProducerError, ProducerResult, fact_producer};
use regex::Regex;

use crate::command::stdout_of;

/// Accounts that are never considered the machine's user.
const EXCLUDED: &[&str] = &["_mbsetupuser", "root", "total"];

/// Comma-separated group names checked by `group_memberships`.
const SEARCH_GROUPS_ENV: &str = "HOSTFACTS_SEARCH_GROUPS";

fact_producer!(
	top_user,
	{ description: "Most frequent user by login count and by connect time" },
	produce: top_user
);

fact_producer!(
	group_memberships,
	{ description: "Search groups the top user by connect time belongs to" },
	produce: group_memberships
);

#[derive(Debug, Clone, PartialEq)]
struct Activity {
	user: String,
	/// Hours connected, summed over days.
	connect_time: f64,
	/// Days with at least one session.
	logins: usize,
}

fn top_user() -> ProducerResult {
	let activity = collect_activity()?;
	Ok(FactMap::from([
		("top_user_by_num_logins".to_string(), FactValue::from(top_by_logins(&activity))),
		("top_user_by_connect_time".to_string(), FactValue::from(top_by_connect_time(&activity))),
	]))
}

fn group_memberships() -> ProducerResult {
	let search = search_groups(env::var(SEARCH_GROUPS_ENV).ok().as_deref());
	let activity = collect_activity()?;

	let found = match top_by_connect_time(&activity) {
		Some(user) if !search.is_empty() => {
			let id_output = stdout_of("/usr/bin/id", &[user])?;
			let groups = id_groups(&id_output)?;
			search.into_iter().filter(|g| groups.contains(g)).collect()
		}
		_ => Vec::new(),
	};
	Ok(FactMap::from([("group_memberships".to_string(), FactValue::List(found))]))
}

fn collect_activity() -> Result<Vec<Activity>, ProducerError> {
	let users = ac_users(&stdout_of("/usr/sbin/ac", &["-p"])?);
	users
		.into_iter()
		.map(|user| {
			let (connect_time, logins) = ac_days(&stdout_of("/usr/sbin/ac", &["-d", &user])?)?;
			Ok(Activity {
				user,
				connect_time,
				logins,
			})
		})
		.collect()
}

/// User names from `ac -p`, minus system accounts and the total line.
fn ac_users(output: &str) -> Vec<String> {
	output
		.lines()
		.filter_map(|line| line.split_whitespace().next())
		.filter(|user| !EXCLUDED.contains(user))
		.map(str::to_string)
		.collect()
}

/// Total connect time and number of days from `ac -d USER`.
///
/// Each line reads `Mon DD  total  HOURS`.
fn ac_days(output: &str) -> Result<(f64, usize), ProducerError> {
	let mut connect_time = 0.0;
	let mut days = 0;
	for line in output.lines().filter(|l| !l.trim().is_empty()) {
		days += 1;
		let hours = line
			.split_whitespace()
			.nth(3)
			.and_then(|h| h.parse::<f64>().ok())
			.ok_or_else(|| ProducerError::failed(format!("unexpected ac line: {line:?}")))?;
		if hours > 0.0 {
			connect_time += hours;
		}
	}
	Ok((connect_time, days))
}

/// On ties the user listed first by `ac -p` wins.
fn top_by_logins(activity: &[Activity]) -> Option<&str> {
	let mut ranked: Vec<_> = activity.iter().collect();
	ranked.sort_by(|a, b| b.logins.cmp(&a.logins));
	ranked.first().map(|a| a.user.as_str())
}

fn top_by_connect_time(activity: &[Activity]) -> Option<&str> {
	let mut ranked: Vec<_> = activity.iter().collect();
	ranked.sort_by(|a, b| b.connect_time.total_cmp(&a.connect_time));
	ranked.first().map(|a| a.user.as_str())
}

fn search_groups(raw: Option<&str>) -> Vec<String> {
	raw.unwrap_or_default()
		.split(',')
		.map(str::trim)
		.filter(|g| !g.is_empty())
		.map(str::to_string)
		.collect()
}

/// Group names from `id USER`, e.g. `uid=501(jdoe) gid=20(staff)
/// groups=20(staff),701(SFO-MacAdmins)`.
fn id_groups(output: &str) -> Result<Vec<String>, ProducerError> {
	let Some((_, groups)) = output.split_once("groups=") else {
		return Ok(Vec::new());
	};
	let entry = Regex::new(r"\d+\(([^)]*)\)").map_err(|e| ProducerError::failed(e.to_string()))?;
	Ok(entry.captures_iter(groups).map(|caps| caps[1].to_string()).collect())
}
