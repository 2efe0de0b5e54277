//! 问答服务
//!
//! 每个用户每个游戏只能完成一次，得分按答对比例计算，积分为
//! round(score/100 × points_reward)，不计连续参与倍率。

use std::sync::Arc;

use pollpeak_shared::observability::metrics;
use tracing::{info, instrument};
use uuid::Uuid;

use super::badge_service::award_after_commit;
use super::dto::{
    AddQuestionInput, CreateTriviaGameInput, QuestionResult, TriviaGameForPlay, TriviaResult,
};
use crate::error::{Result, ServiceError};
use crate::models::{
    NewTriviaGame, NewTriviaQuestion, NewTriviaSession, PlayableQuestion, PointSource, TriviaGame,
    TriviaQuestion,
};
use crate::repository::{ProfileRepositoryTrait, TriviaRepositoryTrait};
use crate::scoring::{trivia_points, trivia_score};

const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];
const MAX_POINTS_REWARD: i32 = 10_000;
const MIN_QUESTION_OPTIONS: usize = 2;
const MAX_QUESTION_OPTIONS: usize = 6;
const MAX_QUESTION_LEN: usize = 500;

/// 逐题判分，返回答对数量与每题结果
fn grade(questions: &[TriviaQuestion], answers: &[i32]) -> (u32, Vec<QuestionResult>) {
    let results: Vec<QuestionResult> = questions
        .iter()
        .zip(answers)
        .map(|(q, &selected)| QuestionResult {
            question_id: q.id,
            selected_index: selected,
            correct_index: q.correct_index,
            is_correct: selected == q.correct_index,
            explanation: q.explanation.clone(),
        })
        .collect();
    let correct = results.iter().filter(|r| r.is_correct).count() as u32;
    (correct, results)
}

pub struct TriviaService<T, P>
where
    T: TriviaRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    trivia_repo: Arc<T>,
    profile_repo: Arc<P>,
}

impl<T, P> TriviaService<T, P>
where
    T: TriviaRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    pub fn new(trivia_repo: Arc<T>, profile_repo: Arc<P>) -> Self {
        Self {
            trivia_repo,
            profile_repo,
        }
    }

    async fn load_game(&self, game_id: i64) -> Result<TriviaGame> {
        self.trivia_repo
            .get_game(game_id)
            .await?
            .ok_or(ServiceError::TriviaGameNotFound(game_id))
    }

    #[instrument(skip(self))]
    pub async fn list_games(&self, include_inactive: bool) -> Result<Vec<TriviaGame>> {
        self.trivia_repo.list_games(!include_inactive).await
    }

    /// 作答视图，不下发正确答案
    #[instrument(skip(self))]
    pub async fn get_game_for_play(&self, game_id: i64) -> Result<TriviaGameForPlay> {
        let game = self.load_game(game_id).await?;
        if !game.is_active {
            return Err(ServiceError::TriviaGameInactive(game_id));
        }
        let questions = self.trivia_repo.list_questions(game_id).await?;
        Ok(TriviaGameForPlay {
            game,
            questions: questions.iter().map(PlayableQuestion::from).collect(),
        })
    }

    /// 提交答案
    ///
    /// `answers[i]` 为第 i 题所选选项的下标，数量必须与题目数一致
    #[instrument(skip(self, answers), fields(user_id = %user_id))]
    pub async fn submit_answers(
        &self,
        user_id: Uuid,
        game_id: i64,
        answers: Vec<i32>,
    ) -> Result<TriviaResult> {
        let game = self.load_game(game_id).await?;
        if !game.is_active {
            return Err(ServiceError::TriviaGameInactive(game_id));
        }

        let profile = self
            .profile_repo
            .get(user_id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(user_id))?;
        if profile.is_banned {
            return Err(ServiceError::UserBanned);
        }
        if self.trivia_repo.has_completed(game_id, user_id).await? {
            return Err(ServiceError::TriviaAlreadyCompleted(game_id));
        }

        let questions = self.trivia_repo.list_questions(game_id).await?;
        if questions.is_empty() {
            return Err(ServiceError::Validation("该游戏还没有题目".to_string()));
        }
        if answers.len() != questions.len() {
            return Err(ServiceError::AnswerCountMismatch {
                expected: questions.len(),
                actual: answers.len(),
            });
        }

        let total = questions.len() as u32;
        let (correct, results) = grade(&questions, &answers);
        let score = trivia_score(correct, total);
        let points = trivia_points(score, game.points_reward);

        self.trivia_repo
            .record_session(&NewTriviaSession {
                game_id,
                user_id,
                correct_answers: correct as i32,
                total_questions: total as i32,
                score: i16::from(score),
                points_earned: points,
            })
            .await?;
        metrics::record_trivia_completion(score);
        metrics::record_points_awarded(PointSource::Trivia.as_str(), points);

        let new_badges = award_after_commit(self.profile_repo.as_ref(), user_id).await;
        info!(
            game_id = game_id,
            correct = correct,
            total = total,
            score = score,
            points = points,
            "问答完成"
        );

        Ok(TriviaResult {
            game_id,
            correct,
            total,
            score,
            points_earned: points,
            questions: results,
            new_badges,
        })
    }

    /// 创建游戏（管理员），新游戏默认未上线
    #[instrument(skip(self, input))]
    pub async fn create_game(&self, input: CreateTriviaGameInput) -> Result<TriviaGame> {
        let title = input.title.trim().to_string();
        if !(3..=200).contains(&title.chars().count()) {
            return Err(ServiceError::Validation(
                "标题长度须为 3-200 个字符".to_string(),
            ));
        }
        let difficulty = input
            .difficulty
            .map(|d| d.trim().to_lowercase())
            .unwrap_or_else(|| "medium".to_string());
        if !DIFFICULTIES.contains(&difficulty.as_str()) {
            return Err(ServiceError::Validation(format!(
                "难度须为 easy、medium 或 hard: {}",
                difficulty
            )));
        }
        if !(0..=MAX_POINTS_REWARD).contains(&input.points_reward) {
            return Err(ServiceError::Validation(
                "积分奖励须在 0-10000 之间".to_string(),
            ));
        }

        let game = self
            .trivia_repo
            .create_game(&NewTriviaGame {
                title,
                category: input
                    .category
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| "general".to_string()),
                difficulty,
                points_reward: input.points_reward,
            })
            .await?;
        info!(game_id = game.id, "问答游戏已创建");
        Ok(game)
    }

    /// 添加题目（管理员）
    #[instrument(skip(self, input))]
    pub async fn add_question(
        &self,
        game_id: i64,
        input: AddQuestionInput,
    ) -> Result<TriviaQuestion> {
        let question = input.question.trim().to_string();
        if question.is_empty() || question.chars().count() > MAX_QUESTION_LEN {
            return Err(ServiceError::Validation(
                "题目长度须为 1-500 个字符".to_string(),
            ));
        }
        let options: Vec<String> = input
            .options
            .into_iter()
            .map(|o| o.trim().to_string())
            .collect();
        if !(MIN_QUESTION_OPTIONS..=MAX_QUESTION_OPTIONS).contains(&options.len())
            || options.iter().any(String::is_empty)
        {
            return Err(ServiceError::Validation(
                "题目须有 2-6 个非空选项".to_string(),
            ));
        }
        let in_bounds =
            usize::try_from(input.correct_index).is_ok_and(|i| i < options.len());
        if !in_bounds {
            return Err(ServiceError::InvalidOption {
                index: input.correct_index,
                options: options.len(),
            });
        }

        self.load_game(game_id).await?;
        let created = self
            .trivia_repo
            .add_question(&NewTriviaQuestion {
                game_id,
                question,
                options,
                correct_index: input.correct_index,
                explanation: input.explanation.filter(|e| !e.trim().is_empty()),
            })
            .await?;
        info!(game_id = game_id, question_id = created.id, "题目已添加");
        Ok(created)
    }

    /// 上线/下线游戏（管理员），上线前至少要有一道题
    #[instrument(skip(self))]
    pub async fn set_game_active(&self, game_id: i64, active: bool) -> Result<TriviaGame> {
        if active && self.trivia_repo.list_questions(game_id).await?.is_empty() {
            self.load_game(game_id).await?;
            return Err(ServiceError::Validation("没有题目的游戏不能上线".to_string()));
        }
        let game = self.trivia_repo.set_game_active(game_id, active).await?;
        info!(game_id = game_id, active = active, "问答游戏状态已更新");
        Ok(game)
    }
}
