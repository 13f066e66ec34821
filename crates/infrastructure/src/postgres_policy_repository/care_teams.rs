use super::*;

#[derive(Debug, FromRow)]
struct CareTeamRow {
    id: String,
    study_reference: Option<String>,
    site_reference: Option<String>,
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
    is_deleted: bool,
}

#[derive(Debug, FromRow)]
struct ParticipantRow {
    care_team_id: String,
    member_reference: String,
    status: String,
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
}

impl ParticipantRow {
    fn into_participant(self) -> AppResult<(String, CareTeamParticipant)> {
        let participant = CareTeamParticipant {
            member: decode_reference(&self.member_reference, "care team member reference")?,
            status: decode_value(&self.status, "care team participant status")?,
            period: period(self.period_start, self.period_end),
        };

        Ok((self.care_team_id, participant))
    }
}

impl PostgresPolicyRepository {
    /// Loads care teams for `scope` whose own period is still open at `now`,
    /// together with their full rosters.
    pub(super) async fn list_current_care_teams_impl(
        &self,
        scope: &[Reference],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CareTeam>> {
        let team_rows = sqlx::query_as::<_, CareTeamRow>(
            r#"
            SELECT id, study_reference, site_reference, period_start, period_end, is_deleted
            FROM care_teams
            WHERE (study_reference = ANY($1) OR site_reference = ANY($1))
              AND (period_end IS NULL OR period_end >= $2)
              AND is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .bind(reference_values(scope))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load care teams: {error}")))?;

        if team_rows.is_empty() {
            return Ok(Vec::new());
        }

        let team_ids: Vec<String> = team_rows.iter().map(|row| row.id.clone()).collect();
        let participant_rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT care_team_id, member_reference, status, period_start, period_end
            FROM care_team_participants
            WHERE care_team_id = ANY($1)
            ORDER BY care_team_id, member_reference
            "#,
        )
        .bind(&team_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load care team participants: {error}"))
        })?;

        let mut rosters: HashMap<String, Vec<CareTeamParticipant>> = HashMap::new();
        for row in participant_rows {
            let (team_id, participant) = row.into_participant()?;
            rosters.entry(team_id).or_default().push(participant);
        }

        team_rows
            .into_iter()
            .map(|row| {
                Ok(CareTeam {
                    participants: rosters.remove(&row.id).unwrap_or_default(),
                    study: decode_optional_reference(
                        row.study_reference.as_deref(),
                        "care team study reference",
                    )?,
                    site: decode_optional_reference(
                        row.site_reference.as_deref(),
                        "care team site reference",
                    )?,
                    period: period(row.period_start, row.period_end),
                    is_deleted: row.is_deleted,
                    id: row.id,
                })
            })
            .collect()
    }
}
