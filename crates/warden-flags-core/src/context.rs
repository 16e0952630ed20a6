// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request metadata attached to an evaluation context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ip: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
	/// ISO 3166-1 alpha-2 country code, e.g. "US".
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
}

impl RequestContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
		self.ip = Some(ip.into());
		self
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	pub fn with_country(mut self, country: impl Into<String>) -> Self {
		self.country = Some(country.into());
		self
	}
}

/// Caller-supplied facts a flag decision is based on.
///
/// Every field is optional. A strategy that needs a field the caller omitted
/// resolves to a disabled result rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub organization_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub roles: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub plan: Option<String>,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub attributes: HashMap<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request: Option<RequestContext>,
}

impl EvaluationContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn with_organization_id(mut self, organization_id: impl Into<String>) -> Self {
		self.organization_id = Some(organization_id.into());
		self
	}

	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());
		self
	}

	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.roles.push(role.into());
		self
	}

	pub fn with_roles<I, S>(mut self, roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.roles.extend(roles.into_iter().map(Into::into));
		self
	}

	pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
		self.plan = Some(plan.into());
		self
	}

	pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
		self.attributes.insert(key.into(), value);
		self
	}

	pub fn with_request(mut self, request: RequestContext) -> Self {
		self.request = Some(request);
		self
	}

	/// Resolves an attribute name used by an attribute rule.
	///
	/// `email`, `role`/`roles` and `plan` come from their dedicated fields;
	/// every other name is looked up in `attributes`. Roles resolve to an
	/// array; an empty role list counts as absent.
	pub fn resolve_attribute(&self, name: &str) -> Option<Value> {
		match name {
			"email" => self.email.clone().map(Value::String),
			"role" | "roles" => {
				if self.roles.is_empty() {
					None
				} else {
					Some(Value::Array(
						self.roles.iter().cloned().map(Value::String).collect(),
					))
				}
			}
			"plan" => self.plan.clone().map(Value::String),
			other => self.attributes.get(other).cloned(),
		}
	}
}
